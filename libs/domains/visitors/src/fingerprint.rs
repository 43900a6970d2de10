use md5::{Digest, Md5};

use crate::models::VisitorFields;

const SEPARATOR: &str = "|";

/// The hashed string: identity fields in fixed order, then birthday and gender
/// when `with_optional` is set and the value is present.
pub fn canonical_source(fields: &VisitorFields, with_optional: bool) -> String {
    let mut parts: Vec<&str> = vec![
        fields.first_name.as_str(),
        fields.middle_name.as_str(),
        fields.last_name.as_str(),
        fields.company_name.as_str(),
        fields.position.as_str(),
        fields.phone.as_str(),
        fields.email.as_str(),
    ];

    if with_optional {
        if let Some(birthday) = fields.birthday.as_deref().filter(|b| !b.is_empty()) {
            parts.push(birthday);
        }
        if let Some(gender) = &fields.gender {
            parts.push(gender.as_ref());
        }
    }

    parts.join(SEPARATOR)
}

/// 128-bit lowercase hex fingerprint of the visitor's identity.
pub fn fingerprint(fields: &VisitorFields, with_optional: bool) -> String {
    let digest = Md5::digest(canonical_source(fields, with_optional).as_bytes());
    format!("{:x}", digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;

    fn ivan() -> VisitorFields {
        VisitorFields {
            first_name: "Ivan".into(),
            middle_name: "".into(),
            last_name: "Petrov".into(),
            company_name: "Acme".into(),
            position: "CEO".into(),
            phone: "+7123".into(),
            email: "i@x.co".into(),
            birthday: None,
            gender: None,
        }
    }

    #[test]
    fn test_canonical_order() {
        assert_eq!(canonical_source(&ivan(), true), "Ivan||Petrov|Acme|CEO|+7123|i@x.co");
    }

    #[test]
    fn test_optional_fields_appended_only_when_present() {
        let full = VisitorFields {
            birthday: Some("1990-01-31".into()),
            gender: Some(Gender::Male),
            ..ivan()
        };
        assert_eq!(
            canonical_source(&full, true),
            "Ivan||Petrov|Acme|CEO|+7123|i@x.co|1990-01-31|male"
        );
        assert_eq!(canonical_source(&full, false), canonical_source(&ivan(), true));
        assert_ne!(fingerprint(&full, true), fingerprint(&ivan(), true));
    }

    #[test]
    fn test_fingerprint_is_stable_hex() {
        let a = fingerprint(&ivan(), true);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(a, fingerprint(&ivan(), true));
    }

    #[test]
    fn test_phone_changes_fingerprint() {
        let other = VisitorFields {
            phone: "+7124".into(),
            ..ivan()
        };
        assert_ne!(fingerprint(&other, true), fingerprint(&ivan(), true));
    }
}
