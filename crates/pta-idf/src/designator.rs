//! Reference-designator classification.

use core::fmt;
use core::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

/// Component family guessed from the reference designator prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DesignatorType {
    IntegratedCircuit,
    Resistor,
    Capacitor,
    Inductor,
    Misc,
}

impl DesignatorType {
    pub const ALL: [DesignatorType; 5] = [
        DesignatorType::IntegratedCircuit,
        DesignatorType::Resistor,
        DesignatorType::Capacitor,
        DesignatorType::Inductor,
        DesignatorType::Misc,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DesignatorType::IntegratedCircuit => "INTEGRATED CIRCUIT",
            DesignatorType::Resistor => "RESISTOR",
            DesignatorType::Capacitor => "CAPACITOR",
            DesignatorType::Inductor => "INDUCTOR",
            DesignatorType::Misc => "MISC",
        }
    }
}

impl fmt::Display for DesignatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DesignatorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        DesignatorType::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| s.to_string())
    }
}

// checked in order, first match wins
static PREFIXES: LazyLock<[(Regex, DesignatorType); 4]> = LazyLock::new(|| {
    let re = |p: &str| Regex::new(p).expect("designator pattern is valid");
    [
        (re(r"^U\d"), DesignatorType::IntegratedCircuit),
        (re(r"^R\d"), DesignatorType::Resistor),
        (re(r"^C\d"), DesignatorType::Capacitor),
        (re(r"^L\d"), DesignatorType::Inductor),
    ]
});

/// Classify a designator such as `U3` or `R101`.
pub fn classify_designator(instance_name: &str) -> DesignatorType {
    PREFIXES
        .iter()
        .find(|(re, _)| re.is_match(instance_name))
        .map(|(_, t)| *t)
        .unwrap_or(DesignatorType::Misc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn documented_examples() {
        assert_eq!(classify_designator("U3"), DesignatorType::IntegratedCircuit);
        assert_eq!(classify_designator("R101"), DesignatorType::Resistor);
        assert_eq!(classify_designator("C7A"), DesignatorType::Capacitor);
        assert_eq!(classify_designator("L2"), DesignatorType::Inductor);
        assert_eq!(classify_designator("XYZ1"), DesignatorType::Misc);
    }

    #[test]
    fn prefix_needs_a_digit() {
        assert_eq!(classify_designator("U"), DesignatorType::Misc);
        assert_eq!(classify_designator("RN1"), DesignatorType::Misc);
        assert_eq!(classify_designator("NOREFDES"), DesignatorType::Misc);
        assert_eq!(classify_designator("u3"), DesignatorType::Misc);
    }

    #[test]
    fn labels_parse_back() {
        for t in DesignatorType::ALL {
            assert_eq!(t.label().parse::<DesignatorType>().unwrap(), t);
        }
        assert!("DIODE".parse::<DesignatorType>().is_err());
    }

    proptest! {
        #[test]
        fn classification_follows_first_character(name in "[A-Z][0-9A-Z]{0,6}") {
            let t = classify_designator(&name);
            let second_is_digit = name.chars().nth(1).is_some_and(|c| c.is_ascii_digit());
            let expected = match (name.chars().next(), second_is_digit) {
                (Some('U'), true) => DesignatorType::IntegratedCircuit,
                (Some('R'), true) => DesignatorType::Resistor,
                (Some('C'), true) => DesignatorType::Capacitor,
                (Some('L'), true) => DesignatorType::Inductor,
                _ => DesignatorType::Misc,
            };
            prop_assert_eq!(t, expected);
        }
    }
}
