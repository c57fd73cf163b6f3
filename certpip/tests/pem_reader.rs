use certpip::*;

const PASSWORD: &[u8] = b"changeit";

fn spki(file: &str, password: Option<&[u8]>) -> Vec<u8> {
    let data = std::fs::read(format!("tests/examples/{}", file)).unwrap();
    read_private_key(&data, password)
        .unwrap()
        .public_key_der()
        .unwrap()
}

#[test]
fn rsa_key_formats_agree() {
    let expected = spki("alice_rsa_key.pem", None);
    assert_eq!(expected, spki("alice_pkcs8_key.pem", None));
    assert_eq!(expected, spki("alice_legacy_encrypted_key.pem", Some(PASSWORD)));
    assert_eq!(expected, spki("alice_pkcs8_encrypted_key.pem", Some(PASSWORD)));

    // the key belongs to the certificate
    let alice = decode_pem_certificate_chain(include_bytes!("examples/alice.pem")).unwrap();
    let cert_spki = der::Encode::to_der(
        &alice[0]
            .decoded_cert
            .tbs_certificate
            .subject_public_key_info,
    )
    .unwrap();
    assert_eq!(expected, cert_spki);
}

#[test]
fn ec_key_formats_agree() {
    let expected = spki("proxy_ec_key.pem", None);
    assert_eq!(expected, spki("proxy_pkcs8_key.pem", None));
    assert_eq!(expected, spki("proxy_legacy_des3_key.pem", Some(PASSWORD)));
    assert_eq!(expected, spki("proxy_with_key.pem", None));
}

#[test]
fn encrypted_key_errors() {
    let data = include_bytes!("examples/alice_legacy_encrypted_key.pem");
    assert!(matches!(
        read_private_key(data, None),
        Err(Error::PasswordRequired)
    ));
    assert!(matches!(
        read_private_key(data, Some(b"wrong")),
        Err(Error::KeyDecryption)
    ));

    let data = include_bytes!("examples/alice_pkcs8_encrypted_key.pem");
    assert!(matches!(
        read_private_key(data, Some(b"wrong")),
        Err(Error::KeyDecryption)
    ));
}

#[test]
fn certificates_only() {
    assert!(matches!(
        read_private_key(include_bytes!("examples/chain_proxy.pem"), None),
        Err(Error::NoKeyMaterial)
    ));

    let objects = read_pem_objects(include_bytes!("examples/proxy_with_key.pem")).unwrap();
    assert_eq!(3, objects.len());
    assert_eq!(1, objects.iter().filter(|o| o.is_key_material()).count());

    let chain =
        decode_pem_certificate_chain(include_bytes!("examples/proxy_with_key.pem")).unwrap();
    assert_eq!(2, chain.len());
    assert_eq!(
        "CN=1234567890,CN=Alice Example,O=Example Grid,C=US",
        chain[0].subject_name()
    );
}

#[test]
fn trust_material_from_folder() {
    let trust = TrustMaterial::new_from_folder("tests/examples/trust").unwrap();
    assert_eq!(1, trust.len());
    assert!(TrustMaterial::new_from_folder("tests/examples/no_such_folder").is_err());
}
