//! Medit ASCII codec (`.mesh` / `.sol`)
//!
//! Keyword-driven text format. Only scalar `SolAtVertices` fields are
//! supported, which is what the flow solver writes. Column names live in a
//! `ReferenceStrings` block and boundary marker names in `# Marker` comments.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::str::SplitWhitespace;

use log::{debug, info};

use crate::DataError;
use crate::codec::{MeshCodec, RawMesh, VERTEX_WIDTH};

const VERSION: usize = 2;
const MARKER_PREFIX: &str = "# Marker ";
const SOL_KEYWORD: &str = "SolAtVertices";
const SCALAR: usize = 1;

/// Codec for the Medit ASCII mesh and solution files
#[derive(Debug, Clone, Copy, Default)]
pub struct MeditCodec;

impl MeshCodec for MeditCodec {
    fn read(&self, mesh: &Path, solution: Option<&Path>) -> Result<RawMesh, DataError> {
        debug!("MeditCodec::read: mesh={} solution={:?}", mesh.display(), solution);
        let text = fs::read_to_string(mesh).map_err(|e| DataError::io(mesh, e))?;
        let mut raw = parse_mesh(mesh, &text)?;

        if let Some(path) = solution {
            let text = fs::read_to_string(path).map_err(|e| DataError::io(path, e))?;
            let sol = parse_solution(path, &text)?;
            let vertices = raw.vertex_count();
            if sol.rows != vertices {
                return Err(DataError::malformed(
                    path,
                    format!("{} solution rows for {} mesh vertices", sol.rows, vertices),
                ));
            }
            raw.solution = sol.values;
            raw.solution_tags = sol.tags;
        }

        Ok(raw)
    }

    fn write(&self, mesh: &Path, solution: Option<&Path>, raw: &RawMesh) -> Result<(), DataError> {
        debug!("MeditCodec::write: mesh={} solution={:?}", mesh.display(), solution);
        let dimension = dimension_of(mesh, raw)?;
        let text = render_mesh(raw, dimension).map_err(|_| DataError::malformed(mesh, "formatting failed"))?;
        fs::write(mesh, text).map_err(|e| DataError::io(mesh, e))?;
        info!("Wrote mesh {}", mesh.display());

        match solution {
            Some(path) if !raw.solution.is_empty() => self.write_solution(path, raw),
            _ => Ok(()),
        }
    }

    fn write_solution(&self, solution: &Path, raw: &RawMesh) -> Result<(), DataError> {
        debug!("MeditCodec::write_solution: path={}", solution.display());
        let dimension = dimension_of(solution, raw)?;
        let rows = raw.vertex_count();
        if rows == 0 || raw.solution.len() % rows != 0 {
            return Err(DataError::RaggedField {
                len: raw.solution.len(),
                vertices: rows,
            });
        }
        let text = render_solution(raw, dimension, rows)
            .map_err(|_| DataError::malformed(solution, "formatting failed"))?;
        fs::write(solution, text).map_err(|e| DataError::io(solution, e))?;
        info!("Wrote solution {}", solution.display());
        Ok(())
    }
}

fn dimension_of(path: &Path, raw: &RawMesh) -> Result<usize, DataError> {
    match raw.dimension() {
        Some(d @ (2 | 3)) => Ok(d),
        _ => Err(DataError::malformed(path, "missing or invalid dimension marker")),
    }
}

/// Whitespace tokenizer over the non-comment part of a file
struct Tokens<'a> {
    path: &'a Path,
    words: SplitWhitespace<'a>,
    /// Upper bound on the number of tokens in the body
    max_tokens: usize,
}

impl<'a> Tokens<'a> {
    fn new(path: &'a Path, body: &'a str) -> Self {
        Self {
            path,
            words: body.split_whitespace(),
            max_tokens: body.len() / 2 + 1,
        }
    }

    /// Number of values announced by a block header
    fn block_size(&self, count: usize, width: usize, what: &str) -> Result<usize, DataError> {
        count
            .checked_mul(width)
            .ok_or_else(|| DataError::malformed(self.path, format!("{} count {} is too large", what, count)))
    }

    /// Preallocation for a block, bounded by what the file can hold
    fn capacity(&self, size: usize) -> usize {
        size.min(self.max_tokens)
    }

    fn next_word(&mut self) -> Option<&'a str> {
        self.words.next()
    }

    fn expect_word(&mut self, what: &str) -> Result<&'a str, DataError> {
        self.words
            .next()
            .ok_or_else(|| DataError::malformed(self.path, format!("unexpected end of file, expected {}", what)))
    }

    fn usize(&mut self, what: &str) -> Result<usize, DataError> {
        let word = self.expect_word(what)?;
        word.parse()
            .map_err(|_| DataError::malformed(self.path, format!("expected {}, found '{}'", what, word)))
    }

    fn i64(&mut self, what: &str) -> Result<i64, DataError> {
        let word = self.expect_word(what)?;
        word.parse()
            .map_err(|_| DataError::malformed(self.path, format!("expected {}, found '{}'", what, word)))
    }

    fn f64(&mut self, what: &str) -> Result<f64, DataError> {
        let word = self.expect_word(what)?;
        word.parse()
            .map_err(|_| DataError::malformed(self.path, format!("expected {}, found '{}'", what, word)))
    }

    fn elements(&mut self, out: &mut Vec<i64>, nodes: usize, kind: &str) -> Result<(), DataError> {
        let count = self.usize(&format!("{} count", kind))?;
        let size = self.block_size(count, nodes + 1, kind)?;
        out.reserve(self.capacity(size));
        for _ in 0..count {
            for _ in 0..=nodes {
                out.push(self.i64(kind)?);
            }
        }
        Ok(())
    }
}

/// Split comment lines off the body, collecting marker names
fn strip_comments(text: &str) -> (String, Vec<String>) {
    let mut body = String::with_capacity(text.len());
    let mut markers = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim_start();
        if let Some(name) = trimmed.strip_prefix(MARKER_PREFIX) {
            markers.push(name.trim().to_string());
        } else if !trimmed.starts_with('#') {
            body.push_str(line);
            body.push('\n');
        }
    }
    (body, markers)
}

fn parse_dimension(tokens: &mut Tokens<'_>) -> Result<usize, DataError> {
    match tokens.usize("dimension")? {
        d @ (2 | 3) => Ok(d),
        d => Err(DataError::malformed(tokens.path, format!("unsupported dimension {}", d))),
    }
}

fn parse_mesh(path: &Path, text: &str) -> Result<RawMesh, DataError> {
    let (body, marker_names) = strip_comments(text);
    let mut tokens = Tokens::new(path, &body);
    let mut raw = RawMesh::default();
    let mut dimension = None;

    while let Some(keyword) = tokens.next_word() {
        match keyword {
            "MeshVersionFormatted" => {
                tokens.usize("version")?;
            }
            "Dimension" => dimension = Some(parse_dimension(&mut tokens)?),
            "Vertices" => {
                let dim = dimension.ok_or_else(|| DataError::malformed(path, "Vertices before Dimension"))?;
                let count = tokens.usize("vertex count")?;
                let size = tokens.block_size(count, VERTEX_WIDTH, "vertex")?;
                raw.vertices.reserve(tokens.capacity(size));
                for _ in 0..count {
                    for _ in 0..dim {
                        raw.vertices.push(tokens.f64("coordinate")?);
                    }
                    if dim == 2 {
                        raw.vertices.push(0.0);
                    }
                    tokens.i64("vertex reference")?;
                }
            }
            "Edges" => tokens.elements(&mut raw.edges, 2, "edge")?,
            "Triangles" => tokens.elements(&mut raw.triangles, 3, "triangle")?,
            "Tetrahedra" => tokens.elements(&mut raw.tetrahedra, 4, "tetrahedron")?,
            "End" => break,
            other => return Err(DataError::malformed(path, format!("unsupported keyword '{}'", other))),
        }
    }

    let dim = dimension.ok_or_else(|| DataError::malformed(path, "missing Dimension"))?;
    raw.markers.push(dim.to_string());
    raw.markers.extend(marker_names);
    Ok(raw)
}

#[derive(Debug)]
struct ParsedSolution {
    rows: usize,
    values: Vec<f64>,
    tags: Vec<String>,
}

fn parse_solution(path: &Path, text: &str) -> Result<ParsedSolution, DataError> {
    let (body, _) = strip_comments(text);
    let mut tokens = Tokens::new(path, &body);
    let mut named: Vec<(usize, String)> = Vec::new();
    let mut solution = None;

    while let Some(keyword) = tokens.next_word() {
        match keyword {
            "MeshVersionFormatted" => {
                tokens.usize("version")?;
            }
            "Dimension" => {
                parse_dimension(&mut tokens)?;
            }
            "ReferenceStrings" => {
                let count = tokens.usize("reference string count")?;
                for _ in 0..count {
                    let target = tokens.expect_word("reference keyword")?;
                    let index = tokens.usize("reference index")?;
                    let name = tokens.expect_word("reference name")?;
                    if target == SOL_KEYWORD {
                        named.push((index, name.to_string()));
                    }
                }
            }
            SOL_KEYWORD => {
                let rows = tokens.usize("solution row count")?;
                let fields = tokens.usize("field count")?;
                for _ in 0..fields {
                    let kind = tokens.usize("field type")?;
                    if kind != SCALAR {
                        return Err(DataError::malformed(
                            path,
                            format!("field type {} is not supported, only scalars", kind),
                        ));
                    }
                }
                let size = tokens.block_size(rows, fields, "solution row")?;
                let mut values = Vec::with_capacity(tokens.capacity(size));
                for _ in 0..size {
                    values.push(tokens.f64("solution value")?);
                }
                solution = Some((rows, fields, values));
            }
            "End" => break,
            other => return Err(DataError::malformed(path, format!("unsupported keyword '{}'", other))),
        }
    }

    let (rows, fields, values) = solution.ok_or_else(|| DataError::malformed(path, "missing SolAtVertices"))?;

    named.sort_by_key(|(i, _)| *i);
    let tags: Vec<String> = named.into_iter().map(|(_, name)| name).collect();
    if !tags.is_empty() && tags.len() != fields {
        return Err(DataError::malformed(
            path,
            format!("{} column names for {} fields", tags.len(), fields),
        ));
    }

    Ok(ParsedSolution { rows, values, tags })
}

fn render_mesh(raw: &RawMesh, dimension: usize) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(out, "MeshVersionFormatted {}", VERSION)?;
    writeln!(out, "Dimension {}", dimension)?;
    for name in raw.markers.iter().skip(1) {
        writeln!(out, "{}{}", MARKER_PREFIX, name)?;
    }

    writeln!(out, "Vertices\n{}", raw.vertex_count())?;
    for v in raw.vertices.chunks_exact(VERTEX_WIDTH) {
        if dimension == 2 {
            writeln!(out, "{:?} {:?} 0", v[0], v[1])?;
        } else {
            writeln!(out, "{:?} {:?} {:?} 0", v[0], v[1], v[2])?;
        }
    }

    render_elements(&mut out, "Edges", &raw.edges, 3)?;
    render_elements(&mut out, "Triangles", &raw.triangles, 4)?;
    render_elements(&mut out, "Tetrahedra", &raw.tetrahedra, 5)?;

    writeln!(out, "End")?;
    Ok(out)
}

fn render_elements(out: &mut String, keyword: &str, buffer: &[i64], width: usize) -> std::fmt::Result {
    if buffer.is_empty() {
        return Ok(());
    }
    writeln!(out, "{}\n{}", keyword, buffer.len() / width)?;
    for element in buffer.chunks_exact(width) {
        let line: Vec<String> = element.iter().map(i64::to_string).collect();
        writeln!(out, "{}", line.join(" "))?;
    }
    Ok(())
}

fn render_solution(raw: &RawMesh, dimension: usize, rows: usize) -> Result<String, std::fmt::Error> {
    let width = raw.solution.len() / rows;
    let mut out = String::new();
    writeln!(out, "MeshVersionFormatted {}", VERSION)?;
    writeln!(out, "Dimension {}", dimension)?;

    if !raw.solution_tags.is_empty() {
        writeln!(out, "ReferenceStrings\n{}", raw.solution_tags.len())?;
        for (i, tag) in raw.solution_tags.iter().enumerate() {
            writeln!(out, "{} {} {}", SOL_KEYWORD, i + 1, tag)?;
        }
    }

    let types = vec![SCALAR.to_string(); width].join(" ");
    writeln!(out, "{}\n{}\n{} {}", SOL_KEYWORD, rows, width, types)?;
    for row in raw.solution.chunks_exact(width) {
        let line: Vec<String> = row.iter().map(|v| format!("{:?}", v)).collect();
        writeln!(out, "{}", line.join(" "))?;
    }

    writeln!(out, "End")?;
    Ok(out)
}
