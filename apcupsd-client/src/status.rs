use std::collections::BTreeMap;

/// Raw key/value status fields as reported by the daemon, before unit
/// stripping or any derived-metric calculation.
pub type RawStatus = BTreeMap<String, String>;

/// Parse the multi-line `Key: Value` status text shared by the `apcaccess`
/// tool and the NIS protocol.
///
/// Keys are split on the first `:` so values may themselves contain colons
/// (the `DATE` field does). Lines without a separator are ignored. apcupsd
/// pads keys to a fixed width, so both halves are trimmed.
pub fn parse_status_text(text: &str) -> RawStatus {
    let mut fields = RawStatus::new();
    for line in text.lines() {
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            fields.insert(key.to_string(), value.trim().to_string());
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_padded_key_value_lines() {
        let text = "STATUS   : ONLINE \nLOADPCT  : 25.0 Percent\nDATE     : 2024-01-01 10:17:38 -0500\n";
        let fields = parse_status_text(text);

        assert_eq!(fields.get("STATUS").map(String::as_str), Some("ONLINE"));
        assert_eq!(fields.get("LOADPCT").map(String::as_str), Some("25.0 Percent"));
        assert_eq!(
            fields.get("DATE").map(String::as_str),
            Some("2024-01-01 10:17:38 -0500")
        );
    }

    #[test]
    fn ignores_lines_without_separator() {
        let fields = parse_status_text("garbage\n\nSTATUS : ONBATT\n");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("STATUS").map(String::as_str), Some("ONBATT"));
    }
}
