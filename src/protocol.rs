//! Discrimination protocols and the name registry
//!
//! A [`Protocol`] is the closed set of forced-choice designs the library knows
//! about. Protocols are selected by registry key (`triangle`, `m_afc`, ...)
//! plus keyword parameters, or by a compact spec string such as
//! `mplusn:m=4,n=3,specified`.

use crate::error::{DiscriminationError, Result};
use crate::numerics::choose;
use std::fmt;

/// Registry keys accepted by [`Protocol::from_name`]
pub const PROTOCOL_KEYS: [&str; 10] = [
    "triangle", "two_afc", "three_afc", "four_afc", "m_afc", "stetrad", "utetrad", "dualpair",
    "duotrio", "mplusn",
];

/// Largest number of alternatives accepted for m-AFC
pub const MAX_ALTERNATIVES: u32 = 1000;

/// Largest group size accepted for M+N designs
pub const MAX_GROUP_SIZE: u32 = 100;

/// A forced-choice sensory discrimination protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Pick the odd sample out of three (AAB, ABB, ...)
    Triangle,
    /// Pick the stronger of two samples
    TwoAfc,
    /// Pick the strongest of three samples
    ThreeAfc,
    /// Pick the strongest of four samples
    FourAfc,
    /// Pick the strongest of `m` samples
    MultipleAfc { m: u32 },
    /// Two A and two B; identify the two samples of the named product
    SpecifiedTetrad,
    /// Two A and two B; sort them into pairs
    UnspecifiedTetrad,
    /// Pick the most different of two pairs (4IAX)
    DualPair,
    /// Match one of two test samples to a control
    DuoTrio,
    /// Split `m` samples of B and `n` samples of A into their groups
    MPlusN { m: u32, n: u32, specified: bool },
}

impl Protocol {
    /// m-alternative forced choice; `m` must be at least 2
    pub fn multiple_afc(m: u32) -> Result<Self> {
        let protocol = Protocol::MultipleAfc { m };
        protocol.validate()?;
        Ok(protocol)
    }

    /// "M + N" sorting task; requires `m >= n >= 1`
    pub fn m_plus_n(m: u32, n: u32, specified: bool) -> Result<Self> {
        let protocol = Protocol::MPlusN { m, n, specified };
        protocol.validate()?;
        Ok(protocol)
    }

    /// Check construction parameters
    pub fn validate(&self) -> Result<()> {
        match *self {
            Protocol::MultipleAfc { m } if m < 2 => Err(DiscriminationError::invalid(format!(
                "m-AFC requires m >= 2, got m = {m}"
            ))),
            Protocol::MultipleAfc { m } if m > MAX_ALTERNATIVES => {
                Err(DiscriminationError::invalid(format!(
                    "m-AFC supports at most {MAX_ALTERNATIVES} alternatives, got m = {m}"
                )))
            }
            Protocol::MPlusN { m, n, .. } if n == 0 => Err(DiscriminationError::invalid(
                format!("M+N requires positive group sizes, got m = {m}, n = {n}"),
            )),
            Protocol::MPlusN { m, n, .. } if m < n => Err(DiscriminationError::invalid(format!(
                "invalid combination of parameters: M >= N expected, got m = {m}, n = {n}"
            ))),
            Protocol::MPlusN { m, n, .. } if m > MAX_GROUP_SIZE => {
                Err(DiscriminationError::invalid(format!(
                    "M+N supports groups of at most {MAX_GROUP_SIZE} samples, got m = {m}, n = {n}"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Probability of a correct response when there is no sensory difference
    pub fn guessing_rate(&self) -> f64 {
        match *self {
            Protocol::Triangle | Protocol::ThreeAfc | Protocol::UnspecifiedTetrad => 1.0 / 3.0,
            Protocol::TwoAfc | Protocol::DualPair | Protocol::DuoTrio => 0.5,
            Protocol::FourAfc => 0.25,
            Protocol::MultipleAfc { m } => 1.0 / f64::from(m),
            Protocol::SpecifiedTetrad => 1.0 / 6.0,
            Protocol::MPlusN { m, n, specified } => {
                let patterns = choose(u64::from(m) + u64::from(n), u64::from(n));
                if m > n || specified {
                    1.0 / patterns
                } else {
                    // Either group may sit entirely below the other
                    2.0 / patterns
                }
            }
        }
    }

    /// Registry key of this protocol
    pub fn key(&self) -> &'static str {
        match self {
            Protocol::Triangle => "triangle",
            Protocol::TwoAfc => "two_afc",
            Protocol::ThreeAfc => "three_afc",
            Protocol::FourAfc => "four_afc",
            Protocol::MultipleAfc { .. } => "m_afc",
            Protocol::SpecifiedTetrad => "stetrad",
            Protocol::UnspecifiedTetrad => "utetrad",
            Protocol::DualPair => "dualpair",
            Protocol::DuoTrio => "duotrio",
            Protocol::MPlusN { .. } => "mplusn",
        }
    }

    /// True when the psychometric function has to be simulated
    pub fn is_simulated(&self) -> bool {
        matches!(self, Protocol::MPlusN { .. })
    }

    /// Build a protocol from a registry key and keyword parameters
    ///
    /// # Errors
    ///
    /// `UnknownProtocol` for an unrecognised key, `InvalidParameter` for
    /// missing, unexpected or out-of-range parameters.
    pub fn from_name(name: &str, params: &ProtocolParams) -> Result<Self> {
        let key = canonical_key(name)
            .ok_or_else(|| DiscriminationError::UnknownProtocol(name.to_string()))?;

        let protocol = match key {
            "m_afc" => {
                params.reject_group_sizes(key)?;
                let m = params.m.ok_or_else(|| {
                    DiscriminationError::invalid("m_afc requires parameter m")
                })?;
                Protocol::multiple_afc(m)?
            }
            "mplusn" => {
                let (m, n) = match (params.m, params.n) {
                    (Some(m), Some(n)) => (m, n),
                    _ => {
                        return Err(DiscriminationError::invalid(
                            "mplusn requires parameters m and n",
                        ))
                    }
                };
                Protocol::m_plus_n(m, n, params.specified)?
            }
            _ => {
                if !params.is_empty() {
                    return Err(DiscriminationError::invalid(format!(
                        "protocol '{key}' takes no parameters"
                    )));
                }
                match key {
                    "triangle" => Protocol::Triangle,
                    "two_afc" => Protocol::TwoAfc,
                    "three_afc" => Protocol::ThreeAfc,
                    "four_afc" => Protocol::FourAfc,
                    "stetrad" => Protocol::SpecifiedTetrad,
                    "utetrad" => Protocol::UnspecifiedTetrad,
                    "dualpair" => Protocol::DualPair,
                    _ => Protocol::DuoTrio,
                }
            }
        };

        Ok(protocol)
    }

    /// Parse a spec string `key[:param=value,...]`
    ///
    /// ```
    /// use thurstone::protocol::Protocol;
    ///
    /// let protocol = Protocol::parse("mplusn:m=4,n=3,specified").unwrap();
    /// assert_eq!(protocol, Protocol::MPlusN { m: 4, n: 3, specified: true });
    /// assert_eq!(Protocol::parse("m_afc:m=5").unwrap().guessing_rate(), 0.2);
    /// ```
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        let (name, args) = match spec.split_once(':') {
            Some((name, args)) => (name.trim(), args),
            None => (spec, ""),
        };
        let params = ProtocolParams::parse(args)?;
        Self::from_name(name, &params)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Protocol::Triangle => write!(f, "triangle"),
            Protocol::TwoAfc => write!(f, "2-AFC"),
            Protocol::ThreeAfc => write!(f, "3-AFC"),
            Protocol::FourAfc => write!(f, "4-AFC"),
            Protocol::MultipleAfc { m } => write!(f, "{m}-AFC"),
            Protocol::SpecifiedTetrad => write!(f, "specified tetrad"),
            Protocol::UnspecifiedTetrad => write!(f, "unspecified tetrad"),
            Protocol::DualPair => write!(f, "dual pair"),
            Protocol::DuoTrio => write!(f, "duo-trio"),
            Protocol::MPlusN { m, n, specified } => {
                write!(f, "{m}+{n}({})", if specified { "S" } else { "U" })
            }
        }
    }
}

/// Map accepted spellings to registry keys
fn canonical_key(name: &str) -> Option<&'static str> {
    let lowered = name.trim().to_ascii_lowercase();
    let key = match lowered.as_str() {
        "triangle" => "triangle",
        "two_afc" | "twoafc" | "2afc" | "2-afc" => "two_afc",
        "three_afc" | "threeafc" | "3afc" | "3-afc" => "three_afc",
        "four_afc" | "fourafc" | "4afc" | "4-afc" => "four_afc",
        "m_afc" | "mafc" => "m_afc",
        "stetrad" | "tets" | "specified_tetrad" => "stetrad",
        "utetrad" | "tetu" | "unspecified_tetrad" => "utetrad",
        "dualpair" | "dual_pair" => "dualpair",
        "duotrio" | "duo_trio" => "duotrio",
        "mplusn" | "m_plus_n" => "mplusn",
        _ => return None,
    };
    Some(key)
}

/// Keyword parameters for parameterised protocols
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProtocolParams {
    pub m: Option<u32>,
    pub n: Option<u32>,
    pub specified: bool,
}

impl ProtocolParams {
    pub fn is_empty(&self) -> bool {
        self.m.is_none() && self.n.is_none() && !self.specified
    }

    fn reject_group_sizes(&self, key: &str) -> Result<()> {
        if self.n.is_some() || self.specified {
            return Err(DiscriminationError::invalid(format!(
                "protocol '{key}' only takes parameter m"
            )));
        }
        Ok(())
    }

    /// Parse `m=4,n=3,specified` (also `specified=false`)
    pub fn parse(args: &str) -> Result<Self> {
        let mut params = ProtocolParams::default();

        for part in args.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = match part.split_once('=') {
                Some((k, v)) => (k.trim(), Some(v.trim())),
                None => (part, None),
            };

            match (key, value) {
                ("m", Some(v)) => params.m = Some(parse_count(key, v)?),
                ("n", Some(v)) => params.n = Some(parse_count(key, v)?),
                ("specified", None) => params.specified = true,
                ("specified", Some(v)) => {
                    params.specified = v.parse::<bool>().map_err(|_| {
                        DiscriminationError::invalid(format!(
                            "specified must be true or false, got '{v}'"
                        ))
                    })?
                }
                _ => {
                    return Err(DiscriminationError::invalid(format!(
                        "unrecognised protocol parameter '{part}'"
                    )))
                }
            }
        }

        Ok(params)
    }
}

fn parse_count(key: &str, value: &str) -> Result<u32> {
    value.parse::<u32>().map_err(|_| {
        DiscriminationError::invalid(format!("{key} must be a non-negative integer, got '{value}'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guessing_rates() {
        assert_eq!(Protocol::Triangle.guessing_rate(), 1.0 / 3.0);
        assert_eq!(Protocol::TwoAfc.guessing_rate(), 0.5);
        assert_eq!(Protocol::ThreeAfc.guessing_rate(), 1.0 / 3.0);
        assert_eq!(Protocol::FourAfc.guessing_rate(), 0.25);
        assert_eq!(Protocol::MultipleAfc { m: 10 }.guessing_rate(), 0.1);
        assert_eq!(Protocol::SpecifiedTetrad.guessing_rate(), 1.0 / 6.0);
        assert_eq!(Protocol::UnspecifiedTetrad.guessing_rate(), 1.0 / 3.0);
        assert_eq!(Protocol::DualPair.guessing_rate(), 0.5);
        assert_eq!(Protocol::DuoTrio.guessing_rate(), 0.5);
    }

    #[test]
    fn test_m_plus_n_guessing_rates() {
        // C(7, 3) = 35 assignments, one correct
        let unspecified = Protocol::m_plus_n(4, 3, false).unwrap();
        assert!((unspecified.guessing_rate() - 1.0 / 35.0).abs() < 1e-15);

        // m = n unspecified: both mirror assignments count
        let symmetric = Protocol::m_plus_n(2, 2, false).unwrap();
        assert!((symmetric.guessing_rate() - 2.0 / 6.0).abs() < 1e-15);

        let specified = Protocol::m_plus_n(2, 2, true).unwrap();
        assert!((specified.guessing_rate() - 1.0 / 6.0).abs() < 1e-15);
    }

    #[test]
    fn test_m_plus_n_rejects_m_below_n() {
        let err = Protocol::m_plus_n(2, 3, false).unwrap_err();
        assert!(matches!(err, DiscriminationError::InvalidParameter(_)));
        assert!(Protocol::m_plus_n(3, 0, false).is_err());
    }

    #[test]
    fn test_multiple_afc_rejects_m_below_two() {
        let err = Protocol::multiple_afc(1).unwrap_err();
        assert!(matches!(err, DiscriminationError::InvalidParameter(_)));
        assert!(Protocol::multiple_afc(2).is_ok());
        assert!(Protocol::multiple_afc(MAX_ALTERNATIVES).is_ok());
    }

    #[test]
    fn test_oversized_designs_rejected() {
        for spec in [
            "m_afc:m=3000000000",
            "m_afc:m=1001",
            "mplusn:m=4000000000,n=1",
            "mplusn:m=101,n=3",
        ] {
            assert!(
                matches!(
                    Protocol::parse(spec),
                    Err(DiscriminationError::InvalidParameter(_))
                ),
                "{spec}"
            );
        }
        assert!(Protocol::m_plus_n(MAX_GROUP_SIZE, MAX_GROUP_SIZE, false).is_ok());
    }

    #[test]
    fn test_registry_roundtrips_every_key() {
        let params = ProtocolParams {
            m: Some(3),
            n: Some(2),
            specified: false,
        };
        for key in PROTOCOL_KEYS {
            let protocol = match key {
                "mplusn" => Protocol::from_name(key, &params).unwrap(),
                "m_afc" => Protocol::from_name(
                    key,
                    &ProtocolParams {
                        m: Some(5),
                        ..Default::default()
                    },
                )
                .unwrap(),
                _ => Protocol::from_name(key, &ProtocolParams::default()).unwrap(),
            };
            assert_eq!(protocol.key(), key);
        }
    }

    #[test]
    fn test_unknown_protocol() {
        let err = Protocol::parse("pentad").unwrap_err();
        assert_eq!(err, DiscriminationError::UnknownProtocol("pentad".to_string()));
    }

    #[test]
    fn test_parse_aliases_and_params() {
        assert_eq!(Protocol::parse("2AFC").unwrap(), Protocol::TwoAfc);
        assert_eq!(Protocol::parse("tetu").unwrap(), Protocol::UnspecifiedTetrad);
        assert_eq!(
            Protocol::parse("mplusn: m=3, n=3, specified=false").unwrap(),
            Protocol::MPlusN {
                m: 3,
                n: 3,
                specified: false
            }
        );
    }

    #[test]
    fn test_parse_rejects_bad_params() {
        assert!(Protocol::parse("triangle:m=3").is_err());
        assert!(Protocol::parse("m_afc").is_err());
        assert!(Protocol::parse("m_afc:m=4,n=2").is_err());
        assert!(Protocol::parse("mplusn:m=4").is_err());
        assert!(Protocol::parse("mplusn:m=four,n=3").is_err());
        assert!(Protocol::parse("mplusn:m=4,n=3,colour=red").is_err());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Protocol::MultipleAfc { m: 5 }.to_string(), "5-AFC");
        assert_eq!(
            Protocol::MPlusN {
                m: 4,
                n: 3,
                specified: false
            }
            .to_string(),
            "4+3(U)"
        );
    }
}
