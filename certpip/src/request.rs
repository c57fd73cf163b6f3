//! Authorization request model populated by a policy information point
//!
//! A [`Request`] carries an ordered list of [`Subject`] values, each holding a collection of
//! [`Attribute`] values, plus a collection of environment attributes. The structures serialize to
//! and from JSON via serde so requests can be read from files by the `piptool` utility.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

/// Data type identifier used for string valued attributes
pub static DATA_TYPE_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

/// [`Attribute`] is an identifier paired with a set of string values.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute identifier
    pub id: String,
    /// Data type identifier of the values
    #[serde(default = "default_data_type")]
    pub data_type: String,
    /// Optional identifier of the entity that asserted the attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    /// Attribute values
    #[serde(default)]
    pub values: Vec<String>,
}

fn default_data_type() -> String {
    DATA_TYPE_STRING.to_string()
}

impl Attribute {
    /// Creates a string valued attribute with no values
    pub fn new(id: &str) -> Self {
        Attribute {
            id: id.to_string(),
            data_type: default_data_type(),
            issuer: None,
            values: Vec::new(),
        }
    }

    /// Creates a string valued attribute with the given values, ignoring duplicates
    pub fn with_values<I, S>(id: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut attr = Attribute::new(id);
        for v in values {
            attr.add_value(v);
        }
        attr
    }

    /// Adds a value unless an identical value is already present
    pub fn add_value<S: Into<String>>(&mut self, value: S) {
        let value = value.into();
        if !self.values.contains(&value) {
            self.values.push(value);
        }
    }
}

/// [`Subject`] is a requester described by a collection of attributes.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    /// Optional subject category identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Subject attributes
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl Subject {
    /// Creates a subject with no attributes
    pub fn new() -> Self {
        Subject::default()
    }

    /// Returns every attribute with the given identifier
    pub fn get_attributes(&self, id: &str) -> Vec<&Attribute> {
        self.attributes.iter().filter(|a| a.id == id).collect()
    }

    /// Appends attributes to the subject. Existing attributes are retained.
    pub fn add_attributes(&mut self, attributes: Vec<Attribute>) {
        self.attributes.extend(attributes);
    }
}

/// [`Request`] is an authorization request.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Ordered list of subjects
    #[serde(default)]
    pub subjects: Vec<Subject>,
    /// Environment attributes
    #[serde(default)]
    pub environment: Vec<Attribute>,
}

impl Request {
    /// Returns every environment attribute with the given identifier
    pub fn get_environment_attributes(&self, id: &str) -> Vec<&Attribute> {
        self.environment.iter().filter(|a| a.id == id).collect()
    }
}

#[test]
fn request_serde_test() {
    let json = r#"{
        "subjects": [
            {"attributes": [{"id": "role", "values": ["admin", "admin", "user"]}]}
        ],
        "environment": [{"id": "profile", "values": ["p1"]}]
    }"#;
    let req: Request = serde_json::from_str(json).unwrap();
    assert_eq!(1, req.subjects.len());
    assert_eq!(DATA_TYPE_STRING, req.subjects[0].attributes[0].data_type);
    assert_eq!(1, req.get_environment_attributes("profile").len());
    assert!(req.get_environment_attributes("other").is_empty());

    let attr = Attribute::with_values("role", ["admin", "admin", "user"]);
    assert_eq!(vec!["admin".to_string(), "user".to_string()], attr.values);

    let mut s = req.subjects[0].clone();
    s.add_attributes(vec![attr]);
    assert_eq!(2, s.get_attributes("role").len());

    let round = serde_json::to_string(&req).unwrap();
    assert_eq!(req, serde_json::from_str::<Request>(&round).unwrap());
}
