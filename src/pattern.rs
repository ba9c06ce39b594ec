use anyhow::{anyhow, Context, Result};
use flate2::{
    read::{GzDecoder, GzEncoder},
    Compression,
};
use std::io::Read;
use tracing::debug;

/// A sparse set of alive cells inside a `width x height` bounding box.
///
/// Patterns are the interchange form between files, presets and grids:
/// a [`Grid`](crate::Grid) can stamp a pattern at any offset and extract its
/// own contents as one.
///
/// # Limitations
///
/// *   **Two-State Only:** Only dead/alive cells are representable.
/// *   **B3/S23 Rule:** RLE headers with any other rule are rejected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pattern {
    width: u32,
    height: u32,
    /// Alive cells as `(x, y)`, sorted row-major without duplicates.
    cells: Vec<(u32, u32)>,
    /// `#C` comment lines, without the prefix.
    comments: Vec<String>,
}

impl Pattern {
    /// Creates a pattern from a list of alive cells.
    ///
    /// The bounding box is the smallest one that contains every cell
    /// together with the origin.
    pub fn from_cells(cells: &[(u32, u32)]) -> Self {
        let mut cells = cells.to_vec();
        cells.sort_unstable_by_key(|&(x, y)| (y, x));
        cells.dedup();
        let width = cells.iter().map(|&(x, _)| x.saturating_add(1)).max().unwrap_or(0);
        let height = cells.iter().map(|&(_, y)| y.saturating_add(1)).max().unwrap_or(0);
        Self {
            width,
            height,
            cells,
            comments: vec![],
        }
    }

    /// Creates a pattern from bitmask rows: bit `j` of `rows[i]` is the cell `(j, i)`.
    ///
    /// ```rust
    /// use life_grid::Pattern;
    ///
    /// let glider = Pattern::from_rows(&[0b010, 0b100, 0b111]);
    /// assert_eq!(glider.population(), 5);
    /// assert_eq!((glider.width(), glider.height()), (3, 3));
    /// ```
    pub fn from_rows(rows: &[u64]) -> Self {
        let cells = rows
            .iter()
            .enumerate()
            .flat_map(|(y, &row)| {
                (0..u64::BITS)
                    .filter(move |&x| row & (1 << x) != 0)
                    .map(move |x| (x, y as u32))
            })
            .collect::<Vec<_>>();
        let mut pattern = Self::from_cells(&cells);
        pattern.height = pattern.height.max(rows.len() as u32);
        pattern
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Alive cells in row-major order.
    pub fn cells(&self) -> &[(u32, u32)] {
        &self.cells
    }

    pub fn population(&self) -> usize {
        self.cells.len()
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// Appends `#C` comment lines that are written out with the RLE header.
    ///
    /// A multi-line comment becomes one `#C` line per line of text.
    pub fn with_comment(mut self, comment: impl AsRef<str>) -> Self {
        self.comments
            .extend(comment.as_ref().lines().map(|line| line.trim_end().to_owned()));
        self
    }

    /// Returns a copy moved so that its bounding box touches both axes.
    pub fn trimmed(&self) -> Self {
        let min_x = self.cells.iter().map(|&(x, _)| x).min().unwrap_or(0);
        let min_y = self.cells.iter().map(|&(_, y)| y).min().unwrap_or(0);
        let cells = self
            .cells
            .iter()
            .map(|&(x, y)| (x - min_x, y - min_y))
            .collect::<Vec<_>>();
        Self {
            comments: self.comments.clone(),
            ..Self::from_cells(&cells)
        }
    }

    /// Creates a pattern from the provided data in the specified format.
    ///
    /// # Errors
    ///
    /// - `RLE`: If data is invalid, uses more than two states, or specifies
    ///   non-B3/S23 rules
    /// - `CompressedRLE`: If decompression fails or RLE parsing errors occur
    pub fn from_format(format: PatternFormat, data: &[u8]) -> Result<Self> {
        match format {
            PatternFormat::RLE => Self::from_rle(data),
            PatternFormat::CompressedRLE => Self::from_compressed_rle(data),
        }
    }

    /// Converts the pattern to the specified format.
    pub fn to_format(&self, format: PatternFormat) -> Result<Vec<u8>> {
        match format {
            PatternFormat::RLE => Ok(self.to_rle()),
            PatternFormat::CompressedRLE => self.to_compressed_rle(),
        }
    }

    /// Reads a pattern from a file, detecting the format by its name.
    pub fn from_file(path: &str) -> Result<Self> {
        let format = PatternFormat::detect(path)?;
        let data = std::fs::read(path).with_context(|| format!("Failed to read {path}"))?;
        let pattern = Self::from_format(format, &data)
            .with_context(|| format!("Failed to parse {path}"))?;
        debug!(
            path,
            width = pattern.width,
            height = pattern.height,
            population = pattern.population(),
            "loaded pattern"
        );
        Ok(pattern)
    }

    /// Writes the pattern to a file, detecting the format by its name.
    pub fn to_file(&self, path: &str) -> Result<()> {
        let format = PatternFormat::detect(path)?;
        let data = self.to_format(format)?;
        std::fs::write(path, data).with_context(|| format!("Failed to write {path}"))?;
        debug!(path, population = self.population(), "saved pattern");
        Ok(())
    }

    fn from_compressed_rle(compressed_data: &[u8]) -> Result<Self> {
        let mut data = vec![];
        GzDecoder::new(compressed_data)
            .read_to_end(&mut data)
            .context("Failed to decompress pattern")?;
        Self::from_rle(&data)
    }

    fn to_compressed_rle(&self) -> Result<Vec<u8>> {
        let data = self.to_rle();
        let mut compressed = vec![];
        GzEncoder::new(&data[..], Compression::best())
            .read_to_end(&mut compressed)
            .context("Failed to compress pattern")?;
        Ok(compressed)
    }

    /// Parses the [extended RLE](https://golly.sourceforge.io/Help/formats.html#rle) format.
    fn from_rle(data: &[u8]) -> Result<Self> {
        let mut comments = vec![];
        let mut lines = data
            .split(|&b| b == b'\n')
            .map(|x| x.strip_suffix(b"\r").unwrap_or(x))
            .filter(|x| {
                if let Some(comment) = x.strip_prefix(b"#C").or_else(|| x.strip_prefix(b"#c")) {
                    comments.push(String::from_utf8_lossy(comment.trim_ascii()).into_owned());
                }
                !x.is_empty() && x[0] != b'#'
            });

        let line = lines.next().ok_or_else(|| anyhow!("Missing header"))?;
        let header = RleHeader::parse(line)?;
        if let Some(rule) = &header.rule {
            if !RleHeader::is_conway_rule(rule) {
                return Err(anyhow!("Only B3/S23 rule is supported, got {rule}"));
            }
        }
        let (width, height) = (header.width, header.height);

        let out_of_bounds =
            |x: u32, y: u32| anyhow!("Pattern data out of bounds: x = {x}, y = {y}");
        let mut cells = vec![];
        let mut x = 0u32;
        let mut y = 0u32;
        let mut count: Option<u32> = None;

        'outer: for line in lines {
            for &b in line {
                // a missing count means a run of one
                let run = count.unwrap_or(1);
                match b {
                    b'0'..=b'9' => {
                        let digit = (b - b'0') as u32;
                        count = Some(
                            count
                                .unwrap_or(0)
                                .checked_mul(10)
                                .and_then(|c| c.checked_add(digit))
                                .ok_or_else(|| anyhow!("Run count too large"))?,
                        );
                        continue;
                    }
                    b'b' => {
                        x = x
                            .checked_add(run)
                            .filter(|&end| end <= width)
                            .ok_or_else(|| out_of_bounds(x.saturating_add(run), y))?;
                    }
                    b'o' => {
                        let end = x
                            .checked_add(run)
                            .filter(|&end| end <= width && y < height)
                            .ok_or_else(|| out_of_bounds(x.saturating_add(run), y))?;
                        cells.extend((x..end).map(|cx| (cx, y)));
                        x = end;
                    }
                    b'$' => {
                        y = y
                            .checked_add(run)
                            .filter(|&end| end <= height)
                            .ok_or_else(|| out_of_bounds(x, y.saturating_add(run)))?;
                        x = 0;
                    }
                    b'!' => break 'outer,
                    b' ' | b'\t' => continue,
                    _ => return Err(anyhow!("Invalid RLE character: '{}'", b as char)),
                }
                count = None;
            }
        }

        let mut pattern = Self::from_cells(&cells);
        pattern.width = width;
        pattern.height = height;
        pattern.comments = comments;
        Ok(pattern)
    }

    /// Writes the trimmed pattern as RLE, wrapping lines at 70 characters.
    fn to_rle(&self) -> Vec<u8> {
        let mut result = vec![];
        for comment in &self.comments {
            result.extend_from_slice(format!("#C {comment}\n").as_bytes());
        }

        // Empty pattern
        if self.cells.is_empty() {
            result.extend_from_slice(b"x = 0, y = 0, rule = B3/S23\n!");
            return result;
        }

        let trimmed = self.trimmed();
        result.extend_from_slice(
            format!(
                "x = {}, y = {}, rule = B3/S23\n",
                trimmed.width, trimmed.height
            )
            .as_bytes(),
        );

        let mut line_length = 0;
        let mut push_run = |result: &mut Vec<u8>, count: u32, tag: u8, reserve: usize| {
            let mut run = Vec::new();
            if count > 1 {
                run.extend_from_slice(count.to_string().as_bytes());
            }
            run.push(tag);
            if line_length + run.len() + reserve > 70 {
                result.push(b'\n');
                line_length = 0;
            }
            result.extend_from_slice(&run);
            line_length += run.len();
        };

        let mut pending_rows = 0;
        let mut cells = trimmed.cells.iter().peekable();
        for y in 0..trimmed.height {
            let mut x = 0;
            let mut row_has_cells = false;
            loop {
                let Some(&(cx, _)) = cells.peek().copied().filter(|&&(_, cy)| cy == y) else {
                    break;
                };
                if !row_has_cells && pending_rows > 0 {
                    push_run(&mut result, pending_rows, b'$', 0);
                    pending_rows = 0;
                }
                row_has_cells = true;
                if cx > x {
                    push_run(&mut result, cx - x, b'b', 0);
                }
                let mut run_length = 0;
                while cells.next_if(|&&(nx, ny)| ny == y && nx == cx + run_length).is_some() {
                    run_length += 1;
                }
                push_run(&mut result, run_length, b'o', 1);
                x = cx + run_length;
            }
            pending_rows += 1;
        }
        result.push(b'!');
        result
    }
}

/// The `x = .., y = .., rule = ..` line that opens an RLE file.
#[derive(Debug, PartialEq, Eq)]
struct RleHeader {
    width: u32,
    height: u32,
    rule: Option<String>,
}

impl RleHeader {
    fn parse(line: &[u8]) -> Result<Self> {
        let line = std::str::from_utf8(line).context("Invalid header: not UTF-8")?;
        let (mut width, mut height, mut rule) = (None, None, None);
        for part in line.split(',') {
            let (key, value) = part.split_once('=').ok_or_else(|| {
                anyhow!("Invalid header: expected key = value, got \"{}\"", part.trim())
            })?;
            let value = value.trim();
            let parse_size = |name: &str| -> Result<u32> {
                value
                    .parse()
                    .with_context(|| format!("Invalid header: bad {name} \"{value}\""))
            };
            let slot_taken = match key.trim() {
                "x" => width.replace(parse_size("x")?).is_some(),
                "y" => height.replace(parse_size("y")?).is_some(),
                "rule" => rule.replace(value.to_owned()).is_some(),
                other => return Err(anyhow!("Invalid header: unknown key \"{other}\"")),
            };
            if slot_taken {
                return Err(anyhow!("Invalid header: repeated key \"{}\"", key.trim()));
            }
        }
        Ok(Self {
            width: width.ok_or_else(|| anyhow!("Invalid header: missing \"x\""))?,
            height: height.ok_or_else(|| anyhow!("Invalid header: missing \"y\""))?,
            rule,
        })
    }

    /// Accepts both the B/S and the older S/B notation of Conway's rule.
    fn is_conway_rule(rule: &str) -> bool {
        rule.eq_ignore_ascii_case("B3/S23") || rule == "23/3"
    }
}

/// Supported formats for pattern serialization and deserialization.
///
/// Notice that only two-state patterns and B3/S23 rules are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternFormat {
    /// [Extended RLE](https://golly.sourceforge.io/Help/formats.html#rle) format:
    /// a text-based format that efficiently encodes patterns using run-length encoding.
    RLE,

    /// Gzip-compressed RLE.
    CompressedRLE,
}

impl PatternFormat {
    /// Detects the format from a file name: `.rle` or `.rle.gz`.
    pub fn detect(filename: &str) -> Result<Self> {
        if filename.ends_with(".rle") {
            Ok(PatternFormat::RLE)
        } else if filename.ends_with(".rle.gz") {
            Ok(PatternFormat::CompressedRLE)
        } else {
            Err(anyhow!("Unknown pattern format: {filename}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLIDER_RLE: &[u8] = b"#C glider\nx = 3, y = 3, rule = B3/S23\nbo$2bo$3o!";

    #[test]
    fn test_from_rows_matches_rle() {
        let rows = Pattern::from_rows(&[0b010, 0b100, 0b111]);
        let rle = Pattern::from_rle(GLIDER_RLE).unwrap();

        assert_eq!(rows.cells(), rle.cells());
        assert_eq!(rle.comments(), ["glider"]);
        assert_eq!((rle.width(), rle.height()), (3, 3));
    }

    #[test]
    fn test_rle_output_glider() {
        let glider = Pattern::from_rows(&[0b010, 0b100, 0b111]);
        assert_eq!(
            glider.to_rle(),
            b"x = 3, y = 3, rule = B3/S23\nbo$2bo$3o!".to_vec()
        );
    }

    #[test]
    fn test_rle_skips_blank_rows() {
        let pattern = Pattern::from_cells(&[(0, 0), (1, 0), (2, 3)]);
        let data = pattern.to_rle();
        assert_eq!(data, b"x = 3, y = 4, rule = B3/S23\n2o3$2bo!".to_vec());
        assert_eq!(Pattern::from_rle(&data).unwrap().cells(), pattern.cells());
    }

    #[test]
    fn test_rle_trims_offset() {
        let pattern = Pattern::from_cells(&[(5, 7), (6, 7)]);
        let parsed = Pattern::from_rle(&pattern.to_rle()).unwrap();
        assert_eq!(parsed.cells(), [(0, 0), (1, 0)]);
    }

    #[test]
    fn test_rle_empty() {
        let data = Pattern::default().to_rle();
        assert_eq!(data, b"x = 0, y = 0, rule = B3/S23\n!".to_vec());
        assert_eq!(Pattern::from_rle(&data).unwrap().population(), 0);
    }

    #[test]
    fn test_rle_wraps_long_lines() {
        let cells = (0..64u32)
            .step_by(2)
            .flat_map(|x| (0..4).map(move |y| (x, y * 2)))
            .collect::<Vec<_>>();
        let pattern = Pattern::from_cells(&cells);
        let data = pattern.to_rle();
        assert!(data.split(|&b| b == b'\n').all(|line| line.len() <= 70));
        assert_eq!(Pattern::from_rle(&data).unwrap().cells(), pattern.cells());
    }

    #[test]
    fn test_rle_rejects_bad_input() {
        assert!(Pattern::from_rle(b"").is_err());
        assert!(Pattern::from_rle(b"x = 3\n!").is_err());
        assert!(Pattern::from_rle(b"x = 3, y = 3, z = 1\n!").is_err());
        assert!(Pattern::from_rle(b"x = 3, y = 3, x = 4\n!").is_err());
        assert!(Pattern::from_rle(b"x = -3, y = 3\n!").is_err());
        assert!(Pattern::from_rle(b"x = 3, y = 3, rule = B36/S23\n3o!").is_err());
        assert!(Pattern::from_rle(b"x = 2, y = 1\n3o!").is_err());
        assert!(Pattern::from_rle(b"x = 3, y = 1\n3q!").is_err());
    }

    #[test]
    fn test_rle_rejects_oversized_counts() {
        // run counts that do not fit into u32
        assert!(Pattern::from_rle(b"x = 3, y = 3\n99999999999o!").is_err());
        assert!(Pattern::from_rle(b"x = 3, y = 3\n4294967296b!").is_err());
        // counts that fit but run past the declared box
        assert!(Pattern::from_rle(b"x = 3, y = 3\n4000000000$4000000000$o!").is_err());
        assert!(Pattern::from_rle(b"x = 3, y = 3\n4000000000bo!").is_err());
        assert!(Pattern::from_rle(b"x = 3, y = 3\n4$o!").is_err());
        // a box as wide as u32 allows, with runs adding up past u32::MAX
        let wide = b"x = 4294967295, y = 1\n4294967295b4294967295b!";
        assert!(Pattern::from_rle(wide).is_err());
        let wide = b"x = 4294967295, y = 1\n4294967294bo4294967295o!";
        assert!(Pattern::from_rle(wide).is_err());
    }

    #[test]
    fn test_rle_accepts_runs_up_to_the_box() {
        let pattern = Pattern::from_rle(b"x = 5, y = 3\n5b$3b2o$!").unwrap();
        assert_eq!(pattern.cells(), [(3, 1), (4, 1)]);
        assert_eq!((pattern.width(), pattern.height()), (5, 3));
        // whitespace between a count and its tag
        let pattern = Pattern::from_rle(b"x = 3, y = 1\n2 o!").unwrap();
        assert_eq!(pattern.cells(), [(0, 0), (1, 0)]);
    }

    #[test]
    fn test_rle_header() {
        let header = RleHeader::parse(b"x = 3, y = 2, rule = b3/s23").unwrap();
        assert_eq!(
            header,
            RleHeader {
                width: 3,
                height: 2,
                rule: Some("b3/s23".to_owned()),
            }
        );
        assert!(RleHeader::is_conway_rule(header.rule.as_deref().unwrap()));
        assert!(RleHeader::is_conway_rule("23/3"));
        assert!(!RleHeader::is_conway_rule("B36/S23"));
        assert_eq!(RleHeader::parse(b"x=1,y=1").unwrap().rule, None);
    }

    #[test]
    fn test_from_cells_at_coordinate_limit() {
        let pattern = Pattern::from_cells(&[(u32::MAX, 0), (0, u32::MAX)]);
        assert_eq!((pattern.width(), pattern.height()), (u32::MAX, u32::MAX));
        assert_eq!(pattern.population(), 2);
    }

    #[test]
    fn test_multiline_comment() {
        let glider = Pattern::from_rows(&[0b010, 0b100, 0b111])
            .with_comment("first line\nx = 1, y = 1\r\nthird");
        assert_eq!(glider.comments(), ["first line", "x = 1, y = 1", "third"]);

        let parsed = Pattern::from_rle(&glider.to_rle()).unwrap();
        assert_eq!(parsed.cells(), glider.cells());
        assert_eq!(parsed.comments(), glider.comments());
    }

    #[test]
    fn test_compressed_rle() {
        let glider = Pattern::from_rle(GLIDER_RLE).unwrap();
        let data = glider.to_format(PatternFormat::CompressedRLE).unwrap();
        let parsed = Pattern::from_format(PatternFormat::CompressedRLE, &data).unwrap();
        assert_eq!(parsed, glider);
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(PatternFormat::detect("a.rle").unwrap(), PatternFormat::RLE);
        assert_eq!(
            PatternFormat::detect("a.rle.gz").unwrap(),
            PatternFormat::CompressedRLE
        );
        assert!(PatternFormat::detect("a.mc").is_err());
    }
}
