//! Typed variable keys.

use core::fmt;
use si_time::TimeIdx;

/// Composite key of a model variable: a base name, zero or more index labels
/// (phase, component, reaction, ...) and an optional time point.
///
/// Two keys that differ only in `time` name the same physical quantity at
/// different instants.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarKey {
    name: String,
    labels: Vec<String>,
    time: Option<TimeIdx>,
}

impl VarKey {
    /// Time-invariant key with no labels.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: Vec::new(),
            time: None,
        }
    }

    /// Append an index label.
    pub fn with(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    /// Attach a time point.
    pub fn at(mut self, t: TimeIdx) -> Self {
        self.time = Some(t);
        self
    }

    /// Same quantity at another time point.
    pub fn at_time(&self, t: TimeIdx) -> Self {
        Self {
            name: self.name.clone(),
            labels: self.labels.clone(),
            time: Some(t),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn time(&self) -> Option<TimeIdx> {
        self.time
    }

    pub fn is_time_indexed(&self) -> bool {
        self.time.is_some()
    }
}

impl fmt::Display for VarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.labels.is_empty() && self.time.is_none() {
            return Ok(());
        }
        write!(f, "[")?;
        let mut first = true;
        if let Some(t) = self.time {
            write!(f, "t{}", t)?;
            first = false;
        }
        for label in &self.labels {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{}", label)?;
            first = false;
        }
        write!(f, "]")
    }
}

impl fmt::Debug for VarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats() {
        assert_eq!(VarKey::new("volume").to_string(), "volume");
        let k = VarKey::new("conc").with("aq").with("S").at(TimeIdx::new(3));
        assert_eq!(k.to_string(), "conc[t3,aq,S]");
    }

    #[test]
    fn at_time_keeps_identity() {
        let k = VarKey::new("x").with("a").at(TimeIdx::new(1));
        let moved = k.at_time(TimeIdx::new(4));
        assert_eq!(moved.name(), "x");
        assert_eq!(moved.labels(), k.labels());
        assert_eq!(moved.time(), Some(TimeIdx::new(4)));
        assert_ne!(moved, k);
        assert_eq!(moved.at_time(TimeIdx::new(1)), k);
    }
}
