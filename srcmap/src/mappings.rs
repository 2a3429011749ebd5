// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::vlq;
use crate::Error;

/// Original-side half of a mapping. Indices point into the map's `sources` and `names`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Original {
    pub source: u32,

    /// 1-indexed.
    pub line: u32,

    /// 0-indexed.
    pub column: u32,

    pub name: Option<u32>,
}

/// One decoded segment with absolute positions.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Mapping {
    /// 1-indexed.
    pub generated_line: u32,

    /// 0-indexed.
    pub generated_column: u32,

    /// `None` for single-field segments, which mark generated code with no original.
    pub original: Option<Original>,
}

impl Mapping {
    pub fn generated(&self) -> (u32, u32) {
        (self.generated_line, self.generated_column)
    }
}

/// All mappings of a source map, sorted by generated position.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Mappings(Vec<Mapping>);

// Fields are relative to the previous segment; only the generated column resets per line.
#[derive(Default)]
struct State {
    source: i64,
    line: i64,
    column: i64,
    name: i64,
}

fn checked(value: i64, line: u32, what: &str) -> Result<u32, Error> {
    u32::try_from(value).map_err(|_| Error::InvalidMapping {
        line,
        reason: format!("{what} out of range: {value}"),
    })
}

impl Mappings {
    /// Decode a `mappings` string.
    ///
    /// # Errors
    ///
    /// If a segment has invalid VLQ, a field count other than 1, 4 or 5, or resolves to a
    /// negative position or index.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let mut mappings = Vec::new();
        let mut state = State::default();

        for (index, line_text) in text.split(';').enumerate() {
            let generated_line = u32::try_from(index + 1).map_err(|_| Error::InvalidMapping {
                line: u32::MAX,
                reason: "too many lines".into(),
            })?;

            let mut generated_column: i64 = 0;

            for segment in line_text.split(',').filter(|s| !s.is_empty()) {
                let fields = vlq::decode(segment).map_err(|source| Error::Vlq {
                    line: generated_line,
                    source,
                })?;

                generated_column += fields[0];

                let original = match fields.len() {
                    1 => None,
                    4 | 5 => {
                        state.source += fields[1];
                        state.line += fields[2];
                        state.column += fields[3];

                        let name = if fields.len() == 5 {
                            state.name += fields[4];
                            Some(checked(state.name, generated_line, "name index")?)
                        } else {
                            None
                        };

                        Some(Original {
                            source: checked(state.source, generated_line, "source index")?,
                            line: checked(state.line + 1, generated_line, "original line")?,
                            column: checked(state.column, generated_line, "original column")?,
                            name,
                        })
                    }
                    n => {
                        return Err(Error::InvalidMapping {
                            line: generated_line,
                            reason: format!("segment `{segment}` has {n} fields"),
                        })
                    }
                };

                mappings.push(Mapping {
                    generated_line,
                    generated_column: checked(generated_column, generated_line, "column")?,
                    original,
                });
            }
        }

        // Stable, so same-position mappings keep their order in the input.
        mappings.sort_by_key(Mapping::generated);

        Ok(Self(mappings))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mapping> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First mapping at or after the position.
    pub fn least_upper_bound(&self, line: u32, column: u32) -> Option<&Mapping> {
        let index = self.0.partition_point(|m| m.generated() < (line, column));
        self.0.get(index)
    }

    /// Last mapping at or before the position. Among mappings sharing that position, the
    /// first one wins.
    pub fn greatest_lower_bound(&self, line: u32, column: u32) -> Option<&Mapping> {
        let end = self.0.partition_point(|m| m.generated() <= (line, column));
        let last = self.0.get(end.checked_sub(1)?)?;
        let first = self.0.partition_point(|m| m.generated() < last.generated());
        self.0.get(first)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn original(source: u32, line: u32, column: u32) -> Option<Original> {
        Some(Original {
            source,
            line,
            column,
            name: None,
        })
    }

    #[test]
    fn parse_relative_fields() -> Result<(), Error> {
        // line 1: col 0 -> src 0, 1:0 ; col 4 -> src 0, 1:4
        // line 2: (empty)
        // line 3: col 2 -> src 1, 3:0 (source +1, line +2, column -4)
        let mappings = Mappings::parse("AAAA,IAAI;;ECEJ")?;

        assert_eq!(
            mappings.iter().copied().collect::<Vec<_>>(),
            vec![
                Mapping {
                    generated_line: 1,
                    generated_column: 0,
                    original: original(0, 1, 0),
                },
                Mapping {
                    generated_line: 1,
                    generated_column: 4,
                    original: original(0, 1, 4),
                },
                Mapping {
                    generated_line: 3,
                    generated_column: 2,
                    original: original(1, 3, 0),
                },
            ]
        );

        Ok(())
    }

    #[test]
    fn parse_names_and_sourceless_segments() -> Result<(), Error> {
        let mappings = Mappings::parse("AAAAA,C")?;
        let all: Vec<_> = mappings.iter().copied().collect();

        assert_eq!(all[0].original.unwrap().name, Some(0));
        assert_eq!(all[1].generated_column, 1);
        assert_eq!(all[1].original, None);

        Ok(())
    }

    #[test]
    fn parse_sorts_unordered_columns() -> Result<(), Error> {
        let mappings = Mappings::parse("IAAA,FAAA")?;
        let columns: Vec<_> = mappings.iter().map(|m| m.generated_column).collect();
        assert_eq!(columns, vec![2, 4]);
        Ok(())
    }

    #[test]
    fn parse_rejects_bad_segments() {
        assert!(matches!(
            Mappings::parse("AA"),
            Err(Error::InvalidMapping { line: 1, .. })
        ));
        assert!(matches!(
            Mappings::parse(";AAAA,A!"),
            Err(Error::Vlq { line: 2, .. })
        ));
        assert!(matches!(
            Mappings::parse("AAAD"),
            Err(Error::InvalidMapping { line: 1, .. })
        ));
    }

    #[test]
    fn lookup_bounds() -> Result<(), Error> {
        let mappings = Mappings::parse("AAAA,IAAI;;ECEJ")?;

        let lub = mappings.least_upper_bound(1, 1).unwrap();
        assert_eq!(lub.generated(), (1, 4));

        let lub = mappings.least_upper_bound(2, 0).unwrap();
        assert_eq!(lub.generated(), (3, 2));

        assert!(mappings.least_upper_bound(3, 3).is_none());

        let glb = mappings.greatest_lower_bound(2, 0).unwrap();
        assert_eq!(glb.generated(), (1, 4));

        assert!(mappings.greatest_lower_bound(0, 0).is_none());

        Ok(())
    }
}
