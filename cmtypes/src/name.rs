use std::str::FromStr;

use crate::utils::Error;

/// A dotted, fully qualified name such as `__jit__.models.Encoder`.
///
/// The last atom is the basename; everything before it is the prefix (the
/// namespace the name lives in).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    atoms: Vec<String>,
}

impl QualifiedName {
    /// Build a name from its atoms. Returns an error if there are no atoms or
    /// if any atom is empty or contains a `.`.
    pub fn from_atoms<I, S>(atoms: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let atoms: Vec<String> = atoms.into_iter().map(Into::into).collect();
        if atoms.is_empty() || atoms.iter().any(|a| a.is_empty() || a.contains('.')) {
            return Err(Error::InvalidQualifiedName {
                name: atoms.join("."),
            });
        }
        Ok(Self { atoms })
    }

    /// All atoms, namespace first.
    pub fn atoms(&self) -> &[String] {
        &self.atoms
    }

    /// The namespace part of the name, empty when the name has a single atom.
    pub fn prefix(&self) -> String {
        self.atoms[..self.atoms.len() - 1].join(".")
    }

    /// The basename (last atom).
    pub fn name(&self) -> &str {
        &self.atoms[self.atoms.len() - 1]
    }

    pub fn qualified_name(&self) -> String {
        self.atoms.join(".")
    }

    /// Copy of this name with `atom` inserted right before the basename.
    pub fn insert_atom_before_name(&self, atom: impl Into<String>) -> Self {
        let mut atoms = self.atoms.clone();
        atoms.insert(atoms.len() - 1, atom.into());
        Self { atoms }
    }

    /// Copy of this name with the atom at `index` replaced.
    pub(crate) fn replace_atom(&self, index: usize, atom: impl Into<String>) -> Self {
        let mut atoms = self.atoms.clone();
        atoms[index] = atom.into();
        Self { atoms }
    }
}

impl FromStr for QualifiedName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_atoms(s.split('.'))
    }
}

impl std::fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.atoms.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_and_name() {
        let name: QualifiedName = "__jit__.models.Encoder".parse().unwrap();
        assert_eq!(name.prefix(), "__jit__.models");
        assert_eq!(name.name(), "Encoder");
        assert_eq!(name.to_string(), "__jit__.models.Encoder");

        let bare: QualifiedName = "Encoder".parse().unwrap();
        assert_eq!(bare.prefix(), "");
    }

    #[test]
    fn rejects_empty_atoms() {
        assert!("a..b".parse::<QualifiedName>().is_err());
        assert!("".parse::<QualifiedName>().is_err());
        assert!(QualifiedName::from_atoms(Vec::<String>::new()).is_err());
    }

    #[test]
    fn insert_before_basename() {
        let name: QualifiedName = "__jit__.M".parse().unwrap();
        assert_eq!(
            name.insert_atom_before_name("___m_0").to_string(),
            "__jit__.___m_0.M"
        );
    }
}
