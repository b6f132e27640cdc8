//! Archive filename derived from the slip number and date of a record.

use scaleslip_core::ExtractedRecord;

const SLIP_KEY_FRAGMENT: &str = "weigh scale load slip";
const DATE_KEY: &str = "DATE IN";

/// Name the archived image after its slip: `{slip}_{date}{ext}`.
///
/// The slip number comes from any key containing "weigh scale load slip"
/// (case-insensitive), with `" / "` turned into `"_"`. The date comes from a
/// key equal to "DATE IN" (case-insensitive), with `/` turned into `-`. When
/// no slip number is present the name falls back to `weigh_scale_{date}{ext}`.
pub fn artifact_filename(record: &ExtractedRecord, extension: &str) -> String {
    let mut slip = String::new();
    let mut date = String::new();

    for (field, value) in record.iter() {
        if field.to_lowercase().contains(SLIP_KEY_FRAGMENT) {
            slip = value.trim().replace(" / ", "_");
        } else if field.to_uppercase() == DATE_KEY {
            date = value.trim().replace('/', "-");
        }
    }

    if slip.is_empty() {
        format!("weigh_scale_{date}{extension}")
    } else {
        format!("{slip}_{date}{extension}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> ExtractedRecord {
        pairs.iter().copied().collect()
    }

    #[test]
    fn slip_and_date() {
        let r = record(&[("Weigh Scale Load Slip #", "194647 / 1"), ("Date In", "08/Sep/25")]);
        assert_eq!(artifact_filename(&r, ".jpg"), "194647_1_08-Sep-25.jpg");
    }

    #[test]
    fn missing_slip_falls_back() {
        let r = record(&[("Date In", "08/Sep/25")]);
        assert_eq!(artifact_filename(&r, ".jpg"), "weigh_scale_08-Sep-25.jpg");
    }

    #[test]
    fn blank_slip_value_falls_back() {
        let r = record(&[("Weigh Scale Load Slip #", "  "), ("Date In", "08/Sep/25")]);
        assert_eq!(artifact_filename(&r, ".png"), "weigh_scale_08-Sep-25.png");
    }

    #[test]
    fn nothing_extracted_still_names() {
        assert_eq!(artifact_filename(&ExtractedRecord::new(), ".png"), "weigh_scale_.png");
    }

    #[test]
    fn key_matching_is_case_insensitive() {
        let r = record(&[("WEIGH SCALE LOAD SLIP NO", " 77 / 2 "), ("date in", "1/Jan/26")]);
        assert_eq!(artifact_filename(&r, ".JPG"), "77_2_1-Jan-26.JPG");
    }

    #[test]
    fn date_key_must_match_exactly() {
        let r = record(&[("Weigh Scale Load Slip #", "5"), ("Date Int", "1/Jan/26")]);
        assert_eq!(artifact_filename(&r, ".jpg"), "5_.jpg");
    }

    #[test]
    fn later_slip_key_overrides_earlier() {
        let r = record(&[
            ("Weigh Scale Load Slip #", "100 / 1"),
            ("Date In", "08/Sep/25"),
            ("weigh scale load slip no", "200 / 2"),
        ]);
        assert_eq!(artifact_filename(&r, ".jpg"), "200_2_08-Sep-25.jpg");
    }

    #[test]
    fn later_date_key_overrides_earlier() {
        let r = record(&[
            ("Weigh Scale Load Slip #", "5"),
            ("Date In", "01/Jan/26"),
            ("DATE IN", "02/Jan/26"),
        ]);
        assert_eq!(artifact_filename(&r, ".jpg"), "5_02-Jan-26.jpg");
    }
}
