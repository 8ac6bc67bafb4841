/// How a carrier can be recognised on a label photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarrierHint {
    /// Spelling the extraction prompt asks the model to use.
    pub name: &'static str,
    pub cues: &'static str,
}

pub const CARRIER_HINTS: &[CarrierHint] = &[
    CarrierHint {
        name: "UPS",
        cues: "brown branding, or a tracking number starting with \"1Z\"",
    },
    CarrierHint {
        name: "USPS",
        cues: "the eagle logo or the text \"United States Postal Service\"",
    },
    CarrierHint {
        name: "FedEx",
        cues: "purple and orange branding",
    },
    CarrierHint {
        name: "Amazon",
        cues: "Amazon branding or an \"AMZL\"-style tracking number",
    },
];
