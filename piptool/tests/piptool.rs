use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

const TA_FOLDER: &str = "../certpip/tests/examples/trust";
const AC_TRUST_FOLDER: &str = "../certpip/tests/examples/ac_trust";
const TOI: &str = "1700000000";

#[test]
fn populate_from_chain() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("piptool")?;
    cmd.arg("-t")
        .arg(TA_FOLDER)
        .arg("-i")
        .arg(TOI)
        .arg("-c")
        .arg("../certpip/tests/examples/chain_proxy.pem");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "http://authz-interop.org/xacml/subject/subject-x509-id",
        ))
        .stdout(predicate::str::contains(
            "CN=Alice Example,O=Example Grid,C=US",
        ))
        .stdout(predicate::str::contains(
            "CN=Example Grid Root CA,O=Example Grid,C=US",
        ));
    Ok(())
}

#[test]
fn populate_with_voms() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("piptool")?;
    cmd.arg("-t")
        .arg(TA_FOLDER)
        .arg("-a")
        .arg(AC_TRUST_FOLDER)
        .arg("-i")
        .arg(TOI)
        .arg("-p")
        .arg("-c")
        .arg("../certpip/tests/examples/chain_proxy_ac.pem");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("/testvo/Role=NULL/Capability=NULL"))
        .stdout(predicate::str::contains(
            "http://authz-interop.org/xacml/subject/voms-primary-fqan",
        ));
    Ok(())
}

#[test]
fn untrusted_chain_fails() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("piptool")?;
    cmd.arg("-t")
        .arg(TA_FOLDER)
        .arg("-i")
        .arg(TOI)
        .arg("-c")
        .arg("../certpip/tests/examples/chain_mallory.pem");
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("ERROR:"));
    Ok(())
}

#[test]
fn untrusted_chain_without_validation() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("piptool")?;
    cmd.arg("-t")
        .arg(TA_FOLDER)
        .arg("--no-pkix")
        .arg("-c")
        .arg("../certpip/tests/examples/chain_mallory.pem");
    cmd.assert().success();
    Ok(())
}

#[test]
fn sha1_chain_requires_flag() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("piptool")?;
    cmd.arg("-t")
        .arg(TA_FOLDER)
        .arg("-i")
        .arg(TOI)
        .arg("-c")
        .arg("../certpip/tests/examples/chain_sha1.pem");
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("ERROR:"));

    let mut cmd = Command::cargo_bin("piptool")?;
    cmd.arg("-t")
        .arg(TA_FOLDER)
        .arg("-i")
        .arg(TOI)
        .arg("--allow-sha1")
        .arg("-c")
        .arg("../certpip/tests/examples/chain_sha1.pem");
    cmd.assert().success().stdout(predicate::str::contains(
        "CN=Frank Example,O=Example Grid,C=US",
    ));
    Ok(())
}

#[test]
fn list_trust_anchors() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("piptool")?;
    cmd.arg("-t").arg(TA_FOLDER).arg("--list-trust-anchors");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "CN=Example Grid Root CA,O=Example Grid,C=US",
        ));
    Ok(())
}

#[test]
fn missing_trust_anchor_folder() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("piptool")?;
    cmd.arg("-c").arg("../certpip/tests/examples/chain_proxy.pem");
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("ERROR:"));
    Ok(())
}

#[test]
fn not_applicable() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let request = dir.path().join("request.json");
    std::fs::write(&request, r#"{"subjects": []}"#)?;
    let mut cmd = Command::cargo_bin("piptool")?;
    cmd.arg("-t").arg(TA_FOLDER).arg("-r").arg(&request);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Not applicable"));
    Ok(())
}
