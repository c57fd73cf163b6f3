use certpip::*;

const ID: &str = "http://authz-interop.org/xacml/subject/cert-chain";

fn subject_with_chain(file: &str) -> Subject {
    let pem = std::fs::read_to_string(format!("tests/examples/{}", file)).unwrap();
    let mut subject = Subject::new();
    subject.add_attributes(vec![Attribute::with_values(ID, [pem])]);
    subject
}

#[test]
fn version_one_certificates_are_rejected() {
    let pe = PipEnvironment::new();
    for (f, index) in [("chain_v1.pem", 0), ("chain_v1_in_middle.pem", 1)] {
        match extract_chain(&pe, &subject_with_chain(f), ID, false).unwrap() {
            ChainExtraction::PolicyRejected(PolicyRejection::VersionTooLow {
                index: i,
                version,
                subject,
            }) => {
                assert_eq!(index, i);
                assert_eq!(1, version);
                assert_eq!("CN=Dave Example,O=Example Grid,C=US", subject);
            }
            other => panic!("unexpected extraction for {}: {:?}", f, other),
        }
        assert_eq!(None, extract(&pe, &subject_with_chain(f), ID, false).unwrap());
    }
}

#[test]
fn proxy_requirement() {
    let pe = PipEnvironment::new();
    assert_eq!(
        ChainExtraction::PolicyRejected(PolicyRejection::ProxyRequired),
        extract_chain(&pe, &subject_with_chain("chain_alice.pem"), ID, true).unwrap()
    );
    for f in [
        "chain_proxy.pem",
        "chain_legacy_proxy.pem",
        "chain_draft_proxy.pem",
    ] {
        let chain = extract(&pe, &subject_with_chain(f), ID, true).unwrap().unwrap();
        assert_eq!(2, chain.len(), "{}", f);
    }
}

#[test]
fn key_material_is_skipped() {
    let pe = PipEnvironment::new();
    let chain = extract(&pe, &subject_with_chain("proxy_with_key.pem"), ID, true)
        .unwrap()
        .unwrap();
    assert_eq!(2, chain.len());
    assert_eq!(
        "CN=Alice Example,O=Example Grid,C=US",
        chain[pe.find_client_cert(&pe, &chain).unwrap()].subject_name()
    );
}

#[test]
fn malformed_chains() {
    let pe = PipEnvironment::new();

    let mut subject = Subject::new();
    subject.add_attributes(vec![Attribute::with_values(ID, ["not a certificate"])]);
    assert!(matches!(
        extract_chain(&pe, &subject, ID, false),
        Err(Error::ChainDecode(_))
    ));

    // more than one value
    let mut subject = subject_with_chain("chain_proxy.pem");
    subject.attributes[0].add_value("second");
    assert_eq!(
        Err(Error::Structural),
        extract_chain(&pe, &subject, ID, false)
    );

    // whitespace only
    let mut subject = Subject::new();
    subject.add_attributes(vec![Attribute::with_values(ID, ["  \n"])]);
    assert_eq!(
        ChainExtraction::Absent,
        extract_chain(&pe, &subject, ID, false).unwrap()
    );
}

fn rewrap(pem: &str, width: usize) -> String {
    let mut out = String::new();
    let mut b64 = String::new();
    for line in pem.lines() {
        if line.starts_with("-----BEGIN ") {
            out.push_str(line);
            out.push('\n');
        } else if line.starts_with("-----END ") {
            if width == 0 {
                out.push_str(&b64);
                out.push('\n');
            } else {
                for chunk in b64.as_bytes().chunks(width) {
                    out.push_str(std::str::from_utf8(chunk).unwrap());
                    out.push('\n');
                }
            }
            b64.clear();
            out.push_str(line);
            out.push('\n');
        } else {
            b64.push_str(line.trim());
        }
    }
    out
}

#[test]
fn base64_line_width() {
    let pe = PipEnvironment::new();
    let pem = std::fs::read_to_string("tests/examples/chain_proxy.pem").unwrap();
    for width in [64, 76, 0] {
        let mut subject = Subject::new();
        subject.add_attributes(vec![Attribute::with_values(ID, [rewrap(&pem, width)])]);
        let chain = extract(&pe, &subject, ID, true).unwrap().unwrap();
        assert_eq!(2, chain.len(), "width {}", width);
    }
    assert_eq!(2, decode_pem_certificate_chain(rewrap(&pem, 76).as_bytes()).unwrap().len());
}
