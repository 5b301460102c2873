//! Element names and scalar encodings of the MSF wire format.

/// Leading U+FEFF written by some Windows exporters; not document content
pub const BYTE_ORDER_MARK: char = '\u{FEFF}';

pub const ROOT: &str = "MSF";
pub const HEADER: &str = "Header";
pub const FUNCTIONS: &str = "Functions";
pub const FUNCTION: &str = "Function";
pub const RANGES: &str = "Ranges";
pub const RANGE: &str = "Range";
pub const PARAMETER: &str = "Parameter";
pub const SPECIFICATIONS: &str = "Specifications";
pub const SPECIFICATION: &str = "Specification";
pub const NOTES: &str = "Notes";
pub const NOTE: &str = "Note";

pub const OBJECT_GUID: &str = "ObjectGUID";
pub const REVISION_GUID: &str = "RevisionGUID";
pub const SEQUENCE: &str = "Sequence";
pub const VERIFIED: &str = "Verified";
pub const REVIEW: &str = "Review";

pub const FORMAT_VERSION: &str = "FormatVersion";

pub const MANUFACTURER: &str = "Manufacturer";
pub const MODEL: &str = "Model";
pub const DESCRIPTION: &str = "Description";
pub const INSTRUMENT_TYPE: &str = "InstrumentType";
pub const PROCEDURE_NUMBER: &str = "ProcedureNumber";
pub const REVISION: &str = "Revision";

pub const BASE_FUNCTION: &str = "BaseFunction";
pub const MODIFIER: &str = "Modifier";
pub const UNIT: &str = "Unit";
pub const ENABLED: &str = "Enabled";

pub const RANGE_VALUE: &str = "RangeValue";
pub const FREQUENCY_BAND: &str = "FrequencyBand";
pub const RESOLUTION: &str = "Resolution";

pub const NOMINAL: &str = "Nominal";
pub const FREQUENCY: &str = "Frequency";

pub const TIME_PERIOD: &str = "TimePeriod";
pub const ACCURACY_READING: &str = "AccuracyReading";
pub const ACCURACY_RANGE: &str = "AccuracyRange";
pub const FLOOR: &str = "Floor";

const TRUE_SENTINEL: &str = "-1";
const FALSE_SENTINEL: &str = "0";

/// `-1` is true; every other value, including empty, is false
pub fn decode_bool(raw: &str) -> bool {
    raw.trim() == TRUE_SENTINEL
}

pub fn encode_bool(value: bool) -> &'static str {
    if value {
        TRUE_SENTINEL
    } else {
        FALSE_SENTINEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_sentinel() {
        assert!(decode_bool("-1"));
        assert!(decode_bool(" -1\n"));
        assert!(!decode_bool("0"));
        assert!(!decode_bool("1"));
        assert!(!decode_bool("-2"));
        assert!(!decode_bool(""));

        assert_eq!(encode_bool(true), "-1");
        assert_eq!(encode_bool(false), "0");
        assert!(decode_bool(encode_bool(true)));
        assert!(!decode_bool(encode_bool(false)));
    }
}
