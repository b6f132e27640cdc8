//! Fixed extraction instruction sent with every slip image.

/// Instruction for the vision model: the exact field list and output shape.
///
/// The example values come from a real slip and double as a format hint.
pub const WEIGH_SCALE_PROMPT: &str = r#"
You are a precise data extractor.

Extract and structure the data from the provided weigh scale load slip image using this exact format:

[
  ["Company", "Louisiana Pacific #473"],
  ["Location", "Dawson Creek #473"],
  ["Scale Site", "473"],
  ["Stratum", "31"],
  ["PopStrYear", "48093126"],
  ["Truck", "1367 4EG"],
  ["Trailer", "8C"],
  ["Contractor", "200495 4EVERGREEN RESOURCES LTD"],
  ["T.Mark", "HK6005"],
  ["Cut Blk", "LM066"],
  ["Patch", ""],
  ["Frm/Cond/Pr", "PULP-LOGS"],
  ["In LDS#", "257042"],
  ["Species", ""],
  ["Date In", "08/Sep/25"],
  ["In Time", "17:05"],
  ["Out Time", "17:31"],
  ["Scaler1/2/S", "461H/461H/"],
  ["Yard Time", "26min"],
  ["Yard", ""],
  ["Source ID", "HK6005-LM066"],
  ["Gross", "64,490 kg"],
  ["Tare", "21,700 kg"],
  ["Net", "42,790 kg"],
  ["Driver", ""],
  ["Form A", "AP LONG 5410-473 - 100%"],
  ["Form B", "AP LONG 5410-473 - 0%"],
  ["Form C", "AP LONG 5410-473 - 0%"],
  ["Weigh Scale Load Slip #", "194647 / 1"],
  ["Load Arrival#", "194"]
]

**Rules:**
- Return values as-is from the image — no reformatting or conversions.
- If any value is missing, leave it blank: `["Field", ""]`
- Return **only** the list structure above — no extra text.
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_entries;
    use crate::response_parser::parse_response;

    #[test]
    fn prompt_example_parses_into_thirty_fields() {
        let entries = parse_response(WEIGH_SCALE_PROMPT).unwrap();
        let record = normalize_entries(&entries);
        assert_eq!(record.len(), 30);
        assert_eq!(record.get("Weigh Scale Load Slip #"), Some("194647 / 1"));
        assert_eq!(record.get("Patch"), Some(""));
    }
}
