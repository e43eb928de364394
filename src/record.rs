use std::fmt;
use std::str::FromStr;

use crate::error::HashError;
use crate::kdf::KdfParams;

const FIELD_SEPARATOR: char = ':';
const FIELD_COUNT: usize = 3;

/// `<params>:<salt-hex>:<key-hex>`, lower-case hex, two digits per byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashRecord {
    params: KdfParams,
    salt: Vec<u8>,
    derived_key: Vec<u8>,
}

impl HashRecord {
    /// Fails if `parse` would refuse the encoded form of the result.
    pub fn new(
        params: KdfParams,
        salt: Vec<u8>,
        derived_key: Vec<u8>,
    ) -> Result<Self, HashError> {
        params.check(salt.len(), derived_key.len())?;

        Ok(Self {
            params,
            salt,
            derived_key,
        })
    }

    pub fn parse(encoded: &str) -> Result<Self, HashError> {
        let fields: Vec<&str> = encoded.split(FIELD_SEPARATOR).collect();
        if fields.len() != FIELD_COUNT {
            return Err(HashError::malformed(format!(
                "expected {FIELD_COUNT} `{FIELD_SEPARATOR}`-separated fields, found {}",
                fields.len()
            )));
        }

        let params: KdfParams = fields[0].parse()?;
        let salt = decode_field(fields[1], "salt")?;
        let derived_key = decode_field(fields[2], "derived key")?;

        Self::new(params, salt, derived_key).map_err(|e| match e {
            HashError::AlgorithmUnavailable(reason) => HashError::MalformedRecord(reason),
            other => other,
        })
    }

    pub fn params(&self) -> &KdfParams {
        &self.params
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    pub fn derived_key(&self) -> &[u8] {
        &self.derived_key
    }
}

fn decode_field(field: &str, what: &str) -> Result<Vec<u8>, HashError> {
    if field.is_empty() {
        return Err(HashError::malformed(format!("{what} is empty")));
    }
    hex::decode(field).map_err(|e| HashError::malformed(format!("{what} is not valid hex: {e}")))
}

impl fmt::Display for HashRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}",
            self.params,
            hex::encode(&self.salt),
            hex::encode(&self.derived_key)
        )
    }
}

impl FromStr for HashRecord {
    type Err = HashError;

    fn from_str(encoded: &str) -> Result<Self, HashError> {
        Self::parse(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY: KdfParams = KdfParams::Pbkdf2Sha1 { iterations: 1000 };

    #[test]
    fn test_encode_pads_leading_zero_bytes() {
        let mut salt = vec![0u8; 24];
        salt[23] = 0x01;
        let mut key = vec![0x0fu8; 24];
        key[0] = 0x00;

        let encoded = HashRecord::new(LEGACY, salt, key).unwrap().to_string();
        let fields: Vec<&str> = encoded.split(':').collect();

        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0], "1000");
        assert_eq!(fields[1].len(), 48);
        assert_eq!(fields[2].len(), 48);
        assert_eq!(fields[1], format!("{}01", "0".repeat(46)));
        assert!(fields[2].starts_with("000f0f"));
    }

    #[test]
    fn test_all_zero_fields_keep_full_width() {
        let encoded = HashRecord::new(LEGACY, vec![0u8; 24], vec![0u8; 24])
            .unwrap()
            .to_string();
        assert_eq!(encoded, format!("1000:{}:{}", "0".repeat(48), "0".repeat(48)));
    }

    #[test]
    fn test_encode_is_lowercase() {
        let encoded = HashRecord::new(LEGACY, vec![0xAB; 24], vec![0xCD; 24])
            .unwrap()
            .to_string();
        assert!(!encoded.chars().any(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn test_new_rejects_unencodable_records() {
        let err = HashRecord::new(LEGACY, vec![], vec![1]).unwrap_err();
        assert!(matches!(err, HashError::AlgorithmUnavailable(_)));

        assert!(HashRecord::new(LEGACY, vec![1], vec![]).is_err());
        let zero = KdfParams::Pbkdf2Sha1 { iterations: 0 };
        assert!(HashRecord::new(zero, vec![1], vec![1]).is_err());
    }

    #[test]
    fn test_constructed_record_reparses() {
        let record = HashRecord::new(LEGACY, vec![0x00, 0x01], vec![0xff]).unwrap();
        assert_eq!(HashRecord::parse(&record.to_string()).unwrap(), record);
    }

    #[test]
    fn test_parse_rejects_oversized_costs() {
        let salt = "11".repeat(16);
        let key = "22".repeat(32);
        let cases = [
            format!("argon2id,m=4294967295,t=1,p=1:{salt}:{key}"),
            format!("argon2id,m=64,t=4294967295,p=1:{salt}:{key}"),
            format!("4294967295:{salt}:{key}"),
            format!("10000001:{salt}:{key}"),
        ];

        for encoded in &cases {
            let err = HashRecord::parse(encoded).unwrap_err();
            assert!(err.is_malformed(), "`{}` gave {:?}", encoded, err);
        }
    }

    #[test]
    fn test_parse_reads_fields() {
        let record = HashRecord::parse("1:73616c74:0c60c80f961f0e71f3a9b524af6012062fe037a6")
            .unwrap();

        assert_eq!(record.params(), &KdfParams::Pbkdf2Sha1 { iterations: 1 });
        assert_eq!(record.salt(), b"salt");
        assert_eq!(record.derived_key().len(), 20);
    }

    #[test]
    fn test_parse_accepts_uppercase_hex() {
        let record = HashRecord::parse("1000:ABCD:EF01").unwrap();
        assert_eq!(record.salt(), &[0xab, 0xcd]);
        assert_eq!(record.to_string(), "1000:abcd:ef01");
    }

    #[test]
    fn test_parse_tagged_record() {
        let encoded = format!("argon2id,m=64,t=1,p=1:{}:{}", "11".repeat(16), "22".repeat(32));
        let record: HashRecord = encoded.parse().unwrap();

        assert_eq!(record.params().name(), "Argon2id");
        assert_eq!(record.salt().len(), 16);
        assert_eq!(record.to_string(), encoded);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let cases = [
            "abc:zz:11",
            "",
            "1000",
            "1000:abcd",
            "1000:abcd:ef01:",
            "1000:abcd:ef01:99",
            "1000::ef01",
            "1000:abcd:",
            "1000:abc:ef01",
            "1000:abcd:ef0",
            "1000:zzzz:ef01",
            "1000:ab cd:ef01",
            "0:abcd:ef01",
            "-5:abcd:ef01",
            "+5:abcd:ef01",
            "argon2id,m=64,t=1,p=1:abcd:ef01",
            "bcrypt,c=10:abcd:ef01",
        ];

        for encoded in cases {
            let err = HashRecord::parse(encoded).unwrap_err();
            assert!(err.is_malformed(), "`{}` gave {:?}", encoded, err);
        }
    }
}
