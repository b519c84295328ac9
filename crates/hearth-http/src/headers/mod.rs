mod entry;
mod header_name;
mod header_value;
mod header_values;
mod known_header_name;
mod unknown_header_name;

pub use entry::{Entry, OccupiedEntry, VacantEntry};
pub use header_name::HeaderName;
pub use header_value::HeaderValue;
pub use header_values::HeaderValues;
pub use known_header_name::KnownHeaderName;

use entry::{OccupiedEntryInner, VacantEntryInner};
use header_name::HeaderNameInner;
use unknown_header_name::UnknownHeaderName;

use hashbrown::{
    hash_map::{self, Entry as HashbrownEntry},
    HashMap,
};
use smartcow::SmartCow;
use std::collections::{
    btree_map::{self, Entry as BTreeEntry},
    BTreeMap,
};
use std::fmt::{self, Debug, Display, Formatter};

/// A request or response header map. Known header names match against
/// [`KnownHeaderName`] without allocating; anything else is stored by
/// its ascii-case-insensitive string form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[must_use]
pub struct Headers {
    known: BTreeMap<KnownHeaderName, HeaderValues>,
    unknown: HashMap<UnknownHeaderName<'static>, HeaderValues>,
}

impl Display for Headers {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (n, v) in self {
            for v in v {
                f.write_fmt(format_args!("{n}: {v}\r\n"))?;
            }
        }
        Ok(())
    }
}

fn is_tchar(c: u8) -> bool {
    matches!(
        c,
        b'a'..=b'z'
        | b'A'..=b'Z'
        | b'0'..=b'9'
        | b'!'
        | b'#'
        | b'$'
        | b'%'
        | b'&'
        | b'\''
        | b'*'
        | b'+'
        | b'-'
        | b'.'
        | b'^'
        | b'_'
        | b'`'
        | b'|'
        | b'~'
    )
}

impl Headers {
    #[doc(hidden)]
    pub fn extend_parse(&mut self, bytes: &[u8]) -> crate::Result<usize> {
        use memchr::memmem::Finder;

        let newlines = Finder::new(b"\r\n").find_iter(bytes).collect::<Vec<_>>();
        let mut new_header_count = 0;
        let mut last_line = 0;
        for newline in newlines {
            if newline == last_line {
                continue;
            }

            let token_start = last_line;
            let mut token_end = token_start;
            while is_tchar(bytes[token_end]) {
                token_end += 1;
            }

            let header_name = HeaderName::parse(&bytes[token_start..token_end])?.to_owned();

            if bytes[token_end] != b':' {
                return Err(crate::Error::InvalidHead);
            }

            let mut value_start = token_end + 1;
            while (bytes[value_start] as char).is_whitespace() {
                value_start += 1;
            }

            let header_value = HeaderValue::parse(&bytes[value_start..newline]);
            self.append(header_name, header_value);
            new_header_count += 1;
            last_line = newline + 2;
        }
        Ok(new_header_count)
    }

    #[doc(hidden)]
    pub fn parse(bytes: &[u8]) -> crate::Result<Self> {
        let mut headers = Headers::new();
        headers.extend_parse(bytes)?;
        Ok(headers)
    }
}

impl Headers {
    /// Construct an empty `Headers`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate over borrowed header names and values. Known headers first,
    /// then unknown ones.
    pub fn iter(&self) -> Iter<'_> {
        self.into()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty() && self.unknown.is_empty()
    }

    /// How many unique [`HeaderName`]s are present. Each name may carry more
    /// than one [`HeaderValue`].
    pub fn len(&self) -> usize {
        self.known.len() + self.unknown.len()
    }

    /// Add values to this header map, combining with any existing values for
    /// the same name. To replace existing values, use [`Headers::insert`].
    pub fn append(
        &mut self,
        name: impl Into<HeaderName<'static>>,
        values: impl Into<HeaderValues>,
    ) -> &mut HeaderValues {
        self.entry(name).append(values)
    }

    /// Combine two `Headers` maps, merging values for shared names.
    pub fn append_all(&mut self, other: Headers) {
        for (name, value) in other.known {
            match self.known.entry(name) {
                BTreeEntry::Occupied(mut entry) => entry.get_mut().extend(value),
                BTreeEntry::Vacant(entry) => {
                    entry.insert(value);
                }
            }
        }

        for (name, value) in other.unknown {
            match self.unknown.entry(name) {
                HashbrownEntry::Occupied(mut entry) => entry.get_mut().extend(value),
                HashbrownEntry::Vacant(entry) => {
                    entry.insert(value);
                }
            }
        }
    }

    /// Combine two `Headers` maps, replacing any existing values for shared names.
    pub fn insert_all(&mut self, other: Headers) {
        for (name, value) in other.known {
            self.known.insert(name, value);
        }

        for (name, value) in other.unknown {
            self.unknown.insert(name, value);
        }
    }

    /// Replace any existing values for this header name.
    pub fn insert(
        &mut self,
        name: impl Into<HeaderName<'static>>,
        values: impl Into<HeaderValues>,
    ) {
        self.entry(name).insert(values);
    }

    /// Insert only if this header name is not already present.
    pub fn try_insert(
        &mut self,
        name: impl Into<HeaderName<'static>>,
        values: impl Into<HeaderValues>,
    ) {
        self.entry(name).or_insert(values);
    }

    /// Insert only if this header name is not already present, computing the
    /// value lazily.
    pub fn try_insert_with<V>(
        &mut self,
        name: impl Into<HeaderName<'static>>,
        values: impl FnOnce() -> V,
    ) -> &mut HeaderValues
    where
        V: Into<HeaderValues>,
    {
        self.entry(name).or_insert_with(values)
    }

    /// A view into the entry for this header name, whether or not populated.
    ///
    /// See also [`Entry`].
    pub fn entry(&mut self, name: impl Into<HeaderName<'static>>) -> Entry<'_> {
        match name.into().0 {
            HeaderNameInner::KnownHeader(known) => match self.known.entry(known) {
                BTreeEntry::Vacant(vacant) => {
                    Entry::Vacant(VacantEntry(VacantEntryInner::Known(vacant)))
                }
                BTreeEntry::Occupied(occupied) => {
                    Entry::Occupied(OccupiedEntry(OccupiedEntryInner::Known(occupied)))
                }
            },

            HeaderNameInner::UnknownHeader(unknown) => match self.unknown.entry(unknown) {
                HashbrownEntry::Occupied(occupied) => {
                    Entry::Occupied(OccupiedEntry(OccupiedEntryInner::Unknown(occupied)))
                }
                HashbrownEntry::Vacant(vacant) => {
                    Entry::Vacant(VacantEntry(VacantEntryInner::Unknown(vacant)))
                }
            },
        }
    }

    /// Retrieves a `&str` header value, following [`HeaderValues::one`] when
    /// several values are present for this name.
    pub fn get_str<'a>(&self, name: impl Into<HeaderName<'a>>) -> Option<&str> {
        self.get_values(name).and_then(HeaderValues::as_str)
    }

    pub(crate) fn get_lower<'a>(&self, name: impl Into<HeaderName<'a>>) -> Option<SmartCow<'_>> {
        self.get_values(name).and_then(HeaderValues::as_lower)
    }

    /// Retrieves a singular header value, following [`HeaderValues::one`].
    pub fn get<'a>(&self, name: impl Into<HeaderName<'a>>) -> Option<&HeaderValue> {
        self.get_values(name).and_then(HeaderValues::one)
    }

    /// Takes all values for this header name out of the map.
    pub fn remove<'a>(&mut self, name: impl Into<HeaderName<'a>>) -> Option<HeaderValues> {
        match name.into().0 {
            HeaderNameInner::KnownHeader(known) => self.known.remove(&known),
            HeaderNameInner::UnknownHeader(unknown) => self.unknown.remove(&&unknown),
        }
    }

    /// All values for this header name. Use [`Headers::get`] if you expect
    /// exactly one.
    pub fn get_values<'a>(&self, name: impl Into<HeaderName<'a>>) -> Option<&HeaderValues> {
        match name.into().0 {
            HeaderNameInner::KnownHeader(known) => self.known.get(&known),
            HeaderNameInner::UnknownHeader(unknown) => self.unknown.get(&&unknown),
        }
    }

    /// Whether this header name has any values at all.
    pub fn has_header<'a>(&self, name: impl Into<HeaderName<'a>>) -> bool {
        match name.into().0 {
            HeaderNameInner::KnownHeader(known) => self.known.contains_key(&known),
            HeaderNameInner::UnknownHeader(unknown) => self.unknown.contains_key(&unknown),
        }
    }

    /// Whether this header's value is ascii-case-insensitively equal to
    /// `needle`. False if the header is absent.
    pub fn eq_ignore_ascii_case<'a>(
        &'a self,
        name: impl Into<HeaderName<'a>>,
        needle: &str,
    ) -> bool {
        self.get_str(name)
            .is_some_and(|v| v.eq_ignore_ascii_case(needle))
    }

    pub fn with_inserted_header(
        mut self,
        name: impl Into<HeaderName<'static>>,
        values: impl Into<HeaderValues>,
    ) -> Self {
        self.insert(name, values);
        self
    }

    pub fn with_appended_header(
        mut self,
        name: impl Into<HeaderName<'static>>,
        values: impl Into<HeaderValues>,
    ) -> Self {
        self.append(name, values);
        self
    }

    pub fn without_header<'a>(mut self, name: impl Into<HeaderName<'a>>) -> Self {
        self.remove(name);
        self
    }

    pub fn without_headers<'a, I, H>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = H>,
        H: Into<HeaderName<'a>>,
    {
        self.remove_all(names);
        self
    }

    pub fn remove_all<'a, I, H>(&mut self, names: I)
    where
        I: IntoIterator<Item = H>,
        H: Into<HeaderName<'a>>,
    {
        for name in names {
            self.remove(name);
        }
    }
}

impl<HN, HV> Extend<(HN, HV)> for Headers
where
    HN: Into<HeaderName<'static>>,
    HV: Into<HeaderValues>,
{
    fn extend<T: IntoIterator<Item = (HN, HV)>>(&mut self, iter: T) {
        for (name, values) in iter {
            self.append(name, values);
        }
    }
}

impl<HN, HV> FromIterator<(HN, HV)> for Headers
where
    HN: Into<HeaderName<'static>>,
    HV: Into<HeaderValues>,
{
    fn from_iter<T: IntoIterator<Item = (HN, HV)>>(iter: T) -> Self {
        let mut headers = Self::new();
        for (name, values) in iter {
            headers.append(name, values);
        }
        headers
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (HeaderName<'a>, &'a HeaderValues);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.into()
    }
}

#[derive(Debug)]
pub struct IntoIter {
    known: btree_map::IntoIter<KnownHeaderName, HeaderValues>,
    unknown: hash_map::IntoIter<UnknownHeaderName<'static>, HeaderValues>,
}

impl Iterator for IntoIter {
    type Item = (HeaderName<'static>, HeaderValues);

    fn next(&mut self) -> Option<Self::Item> {
        let IntoIter { known, unknown } = self;
        known
            .next()
            .map(|(k, v)| (HeaderName::from(k), v))
            .or_else(|| unknown.next().map(|(k, v)| (HeaderName::from(k), v)))
    }
}

impl From<Headers> for IntoIter {
    fn from(value: Headers) -> Self {
        Self {
            known: value.known.into_iter(),
            unknown: value.unknown.into_iter(),
        }
    }
}

#[derive(Debug)]
pub struct Iter<'a> {
    known: btree_map::Iter<'a, KnownHeaderName, HeaderValues>,
    unknown: hash_map::Iter<'a, UnknownHeaderName<'static>, HeaderValues>,
}

impl<'a> From<&'a Headers> for Iter<'a> {
    fn from(value: &'a Headers) -> Self {
        Iter {
            known: value.known.iter(),
            unknown: value.unknown.iter(),
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (HeaderName<'a>, &'a HeaderValues);

    fn next(&mut self) -> Option<Self::Item> {
        let Iter { known, unknown } = self;
        known
            .next()
            .map(|(k, v)| (HeaderName::from(*k), v))
            .or_else(|| unknown.next().map(|(k, v)| (HeaderName::from(&**k), v)))
    }
}

impl IntoIterator for Headers {
    type Item = (HeaderName<'static>, HeaderValues);
    type IntoIter = IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KnownHeaderName::{ContentLength, ContentType};

    #[test]
    fn append_and_get() {
        let mut headers = Headers::new();
        headers.append(ContentType, "text/plain");
        assert_eq!(headers.get_str(ContentType), Some("text/plain"));
    }

    #[test]
    fn known_and_unknown_coexist() {
        let mut headers = Headers::new();
        headers.insert(ContentLength, 5u64);
        headers.insert("x-request-id", "abc123");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get_str("X-Request-Id"), Some("abc123"));
    }

    #[test]
    fn unknown_header_names_are_case_insensitive() {
        let mut headers = Headers::new();
        headers.insert("X-Custom", "1");
        assert!(headers.has_header("x-custom"));
    }

    #[test]
    fn parse_header_block() {
        let headers = Headers::parse(b"Host: example.com\r\nContent-Length: 4\r\n").unwrap();
        assert_eq!(headers.get_str(crate::KnownHeaderName::Host), Some("example.com"));
        assert_eq!(headers.get_str(ContentLength), Some("4"));
    }
}
