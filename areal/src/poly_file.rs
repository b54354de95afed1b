// Copyright 2025 the Areal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Osmosis `.poly` polygon filter files.
//!
//! ```text
//! germany
//! 1
//!    5.86 47.27
//!    15.04 47.27
//!    15.04 55.06
//! END
//! !2
//!    10.0 50.0
//!    10.1 50.0
//!    10.1 50.1
//! END
//! END
//! ```
//!
//! The first line is a name. Each section starts with a header line and lists
//! one `lng lat` pair per line until `END`; a header starting with `!` marks
//! a hole. A final `END` closes the file.

use std::path::Path;

use crate::error::{Error, Result};
use crate::geometry::{ExactGeometry, KurboGeometry, KurboMultiPolygon};
use crate::latlng::LatLng;

/// A parsed `.poly` file, shaped for [`AreaDb::add_poly`](crate::AreaDb::add_poly).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PolyFile {
    /// Name from the first line.
    pub name: String,
    /// Outer rings in file order.
    pub outer: Vec<Vec<LatLng>>,
    /// `inner[i]` are the holes of `outer[i]`.
    pub inner: Vec<Vec<Vec<LatLng>>>,
}

struct Section {
    header_line: usize,
    hole: bool,
    ring: Vec<LatLng>,
}

fn format_error(line: usize, reason: impl Into<String>) -> Error {
    Error::PolyFormat {
        line,
        reason: reason.into(),
    }
}

impl PolyFile {
    /// Read and parse the file at `path`.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse `.poly` text.
    ///
    /// A ring's repeated closing point is dropped. Each hole is attached to the
    /// first outer ring containing its first point.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty());

        let (_, name) = lines.next().ok_or_else(|| format_error(1, "missing name line"))?;
        let mut sections = Vec::new();
        let mut last_line = 1;
        loop {
            let Some((header_line, header)) = lines.next() else {
                return Err(format_error(last_line, "missing final END"));
            };
            if header == "END" {
                break;
            }
            let mut section = Section {
                header_line,
                hole: header.starts_with('!'),
                ring: Vec::new(),
            };
            last_line = header_line;
            loop {
                let Some((n, line)) = lines.next() else {
                    return Err(format_error(last_line, "section is not closed by END"));
                };
                last_line = n;
                if line == "END" {
                    break;
                }
                section.ring.push(parse_point(n, line)?);
            }
            if section.ring.len() > 1 && section.ring.first() == section.ring.last() {
                section.ring.pop();
            }
            if section.ring.is_empty() {
                return Err(format_error(header_line, "section has no points"));
            }
            sections.push(section);
        }

        let mut poly = Self {
            name: name.to_owned(),
            ..Self::default()
        };
        let (holes, shells): (Vec<_>, Vec<_>) = sections.into_iter().partition(|s| s.hole);
        for shell in shells {
            poly.outer.push(shell.ring);
            poly.inner.push(Vec::new());
        }

        let g = KurboGeometry;
        let parts: Vec<KurboMultiPolygon> = poly
            .outer
            .iter()
            .map(|r| g.multi_polygon(vec![g.polygon(g.ring(r), Vec::new())]))
            .collect();
        for hole in holes {
            let first = hole.ring[0];
            let Some(owner) = parts.iter().position(|p| g.contains(p, first)) else {
                return Err(format_error(
                    hole.header_line,
                    "hole is not inside any outer ring",
                ));
            };
            poly.inner[owner].push(hole.ring);
        }
        Ok(poly)
    }

    /// Whether `pos` is inside an outer ring and outside its holes.
    pub fn contains(&self, pos: LatLng) -> bool {
        let g = KurboGeometry;
        let parts = self
            .outer
            .iter()
            .zip(&self.inner)
            .map(|(o, holes)| g.polygon(g.ring(o), holes.iter().map(|h| g.ring(h)).collect()))
            .collect();
        g.contains(&g.multi_polygon(parts), pos)
    }
}

fn parse_point(line: usize, text: &str) -> Result<LatLng> {
    let mut fields = text.split_whitespace();
    let (Some(lng), Some(lat), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err(format_error(line, format!("expected `lng lat`, got `{text}`")));
    };
    let number = |s: &str| {
        s.parse::<f64>()
            .map_err(|e| format_error(line, format!("bad coordinate `{s}`: {e}")))
    };
    Ok(LatLng::new(number(lat)?, number(lng)?))
}
