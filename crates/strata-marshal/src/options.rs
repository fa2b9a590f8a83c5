use std::fmt;

use serde::{Deserialize, Serialize};

/// Marshaling options passed explicitly to every write and read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Record type tags so values read back exactly as written.
    pub store_type_information: bool,
    /// Produce data MATLAB can load: at-least-2-D shapes, char matrices,
    /// and `MATLAB_class` attributes.
    pub matlab_compatible: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            store_type_information: true,
            matlab_compatible: true,
        }
    }
}

impl Options {
    /// Type tags only; no MATLAB attributes.
    pub fn fidelity() -> Self {
        Self {
            store_type_information: true,
            matlab_compatible: false,
        }
    }

    /// MATLAB layout without type tags.
    pub fn matlab() -> Self {
        Self {
            store_type_information: false,
            matlab_compatible: true,
        }
    }

    /// Raw data only. Readers infer every type from dtype and shape.
    pub fn bare() -> Self {
        Self {
            store_type_information: false,
            matlab_compatible: false,
        }
    }

    pub fn with_store_type_information(mut self, enabled: bool) -> Self {
        self.store_type_information = enabled;
        self
    }

    pub fn with_matlab_compatible(mut self, enabled: bool) -> Self {
        self.matlab_compatible = enabled;
        self
    }

    /// Resolve the regime these options select.
    ///
    /// Type information wins: with both flags set values are tagged, so
    /// reads reproduce them exactly even from the MATLAB layout.
    pub fn regime(&self) -> Regime {
        match (self.store_type_information, self.matlab_compatible) {
            (true, _) => Regime::Fidelity,
            (false, true) => Regime::Matlab,
            (false, false) => Regime::Bare,
        }
    }

    /// The shapes and encodings datasets and groups are written with.
    pub fn layout(&self) -> Layout {
        if self.matlab_compatible {
            Layout::Matlab
        } else {
            Layout::Natural
        }
    }
}

/// How much of a value survives a write and read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    /// Type tags recorded; reads reproduce the written value in either
    /// [`Layout`].
    Fidelity,
    /// MATLAB shapes and string encodings; reads are lossy.
    Matlab,
    /// Natural shapes, no metadata; reads infer types.
    Bare,
}

impl Regime {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fidelity => "fidelity",
            Self::Matlab => "matlab",
            Self::Bare => "bare",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shape and string conventions for stored nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Values keep their own shapes.
    Natural,
    /// At-least-2-D arrays, char matrices for strings, and `MATLAB_class`
    /// attributes.
    Matlab,
}
