use smallvec::SmallVec;

/// Attribute names left out of one partial update.
///
/// Matching is exact and case-sensitive. Duplicates are harmless and names
/// that match no attribute are ignored.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet<'a> {
    names: SmallVec<[&'a str; 8]>,
}

impl<'a> ExclusionSet<'a> {
    pub fn new() -> Self {
        ExclusionSet {
            names: SmallVec::new(),
        }
    }

    pub fn insert(&mut self, name: &'a str) {
        if !self.contains(name) {
            self.names.push(name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| *n == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &&'a str> {
        self.names.iter()
    }
}

impl<'a> From<&[&'a str]> for ExclusionSet<'a> {
    fn from(names: &[&'a str]) -> Self {
        names.iter().copied().collect()
    }
}

impl<'a> FromIterator<&'a str> for ExclusionSet<'a> {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = ExclusionSet::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}
