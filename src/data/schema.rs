use std::fmt;

// ---------------------------------------------------------------------------
// Field names
// ---------------------------------------------------------------------------

pub const SPECIES: &str = "species";

// ---------------------------------------------------------------------------
// NumericField – the four bounded measurements
// ---------------------------------------------------------------------------

/// A measured, real-valued field. Declaration order is column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NumericField {
    BillLength,
    BillDepth,
    FlipperLength,
    BodyMass,
}

impl NumericField {
    pub const ALL: [NumericField; 4] = [
        NumericField::BillLength,
        NumericField::BillDepth,
        NumericField::FlipperLength,
        NumericField::BodyMass,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NumericField::BillLength => "bill_length_mm",
            NumericField::BillDepth => "bill_depth_mm",
            NumericField::FlipperLength => "flipper_length_mm",
            NumericField::BodyMass => "body_mass_g",
        }
    }

    /// Human-readable label for input widgets.
    pub fn label(self) -> &'static str {
        match self {
            NumericField::BillLength => "Bill length (mm)",
            NumericField::BillDepth => "Bill depth (mm)",
            NumericField::FlipperLength => "Flipper length (mm)",
            NumericField::BodyMass => "Body mass (g)",
        }
    }

    /// Documented input range `(min, max)`. Not enforced by the encoder.
    pub fn bounds(self) -> (f64, f64) {
        match self {
            NumericField::BillLength => (32.1, 59.6),
            NumericField::BillDepth => (13.1, 21.5),
            NumericField::FlipperLength => (172.0, 231.0),
            NumericField::BodyMass => (2700.0, 6300.0),
        }
    }

    /// Starting value for input widgets.
    pub fn default_value(self) -> f64 {
        match self {
            NumericField::BillLength => 43.9,
            NumericField::BillDepth => 17.2,
            NumericField::FlipperLength => 201.0,
            NumericField::BodyMass => 4207.0,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// CategoricalField – fields with a declared vocabulary
// ---------------------------------------------------------------------------

/// A categorical field whose vocabulary is fixed up front, so that the
/// indicator columns never depend on which values a particular call observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CategoricalField {
    Island,
    Sex,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 2] = [CategoricalField::Island, CategoricalField::Sex];

    pub fn name(self) -> &'static str {
        match self {
            CategoricalField::Island => "island",
            CategoricalField::Sex => "sex",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CategoricalField::Island => "Island",
            CategoricalField::Sex => "Sex",
        }
    }

    /// Known values, in the order input widgets list them.
    pub fn vocabulary(self) -> &'static [&'static str] {
        match self {
            CategoricalField::Island => &["Biscoe", "Dream", "Torgersen"],
            CategoricalField::Sex => &["male", "female"],
        }
    }

    pub fn contains(self, value: &str) -> bool {
        self.vocabulary().contains(&value)
    }

    /// Name of the indicator column for `value`, e.g. `island_Dream`.
    pub fn indicator_name(self, value: &str) -> String {
        format!("{}_{}", self.name(), value)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether `name` is one of the six feature fields or `species`.
pub fn is_known_field(name: &str) -> bool {
    name == SPECIES
        || NumericField::from_name(name).is_some()
        || CategoricalField::from_name(name).is_some()
}
