/// Defines how file contents are encoded on the wire.
///
/// Binary and Continuous are both plain 8-bit byte streams here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferType {
    Ascii,
    #[default]
    Binary,
    Continuous,
}

impl TransferType {
    /// Parses the `TYPE` argument (`A`, `B` or `C`, case-insensitive).
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "A" => Some(TransferType::Ascii),
            "B" => Some(TransferType::Binary),
            "C" => Some(TransferType::Continuous),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransferType::Ascii => "Ascii",
            TransferType::Binary => "Binary",
            TransferType::Continuous => "Continuous",
        }
    }

    pub fn is_ascii(&self) -> bool {
        matches!(self, TransferType::Ascii)
    }
}
