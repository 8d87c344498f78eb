use std::collections::BTreeMap;

// Query parameters shared by the request pipeline and the paginator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    One(String),
    Many(Vec<String>),
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::One(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::One(v.to_string())
    }
}

impl From<u64> for ParamValue {
    fn from(v: u64) -> Self {
        ParamValue::One(v.to_string())
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        ParamValue::One(v.to_string())
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::One(if v { "true" } else { "false" }.to_string())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(v: Vec<String>) -> Self {
        ParamValue::Many(v)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Group decoded query pairs, turning repeated keys into [`ParamValue::Many`].
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map: BTreeMap<String, ParamValue> = BTreeMap::new();
        for (k, v) in pairs {
            let (k, v): (String, String) = (k.into(), v.into());
            let merged = match map.remove(&k) {
                None => ParamValue::One(v),
                Some(ParamValue::One(prev)) => ParamValue::Many(vec![prev, v]),
                Some(ParamValue::Many(mut prev)) => {
                    prev.push(v);
                    ParamValue::Many(prev)
                }
            };
            map.insert(k, merged);
        }
        Params(map)
    }

    /// Flatten into wire pairs; list values become one pair per element.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.0.len());
        for (k, v) in &self.0 {
            match v {
                ParamValue::One(s) => pairs.push((k.clone(), s.clone())),
                ParamValue::Many(items) => {
                    pairs.extend(items.iter().map(|s| (k.clone(), s.clone())));
                }
            }
        }
        pairs
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a String, &'a ParamValue);
    type IntoIter = std::collections::btree_map::Iter<'a, String, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
