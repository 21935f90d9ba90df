use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SuperResError};

/// Integer pixel displacement of one observed frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionShift {
    pub dx: i32,
    pub dy: i32,
}

impl MotionShift {
    pub fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

/// Ordered motion shifts, one per observed frame index.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionShiftSequence {
    shifts: Vec<MotionShift>,
}

impl MotionShiftSequence {
    pub fn new(shifts: Vec<MotionShift>) -> Self {
        Self { shifts }
    }

    pub fn len(&self) -> usize {
        self.shifts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
    }

    /// Bounds-checked lookup of the shift for frame `index`.
    pub fn get(&self, index: usize) -> Result<MotionShift> {
        self.shifts
            .get(index)
            .copied()
            .ok_or(SuperResError::FrameIndexOutOfRange {
                index,
                total: self.shifts.len(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &MotionShift> {
        self.shifts.iter()
    }

    /// Parse the text format: one `dx dy` pair per line. Blank lines and
    /// lines starting with `#` are skipped.
    pub fn parse(text: &str) -> Result<Self> {
        let mut shifts = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 2 {
                return Err(SuperResError::InvalidMotion {
                    line: line_no + 1,
                    message: format!("expected 2 values, found {}", fields.len()),
                });
            }
            let parse = |s: &str| {
                s.parse::<i32>().map_err(|e| SuperResError::InvalidMotion {
                    line: line_no + 1,
                    message: format!("'{s}': {e}"),
                })
            };
            shifts.push(MotionShift::new(parse(fields[0])?, parse(fields[1])?));
        }
        Ok(Self { shifts })
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn to_text(&self) -> String {
        self.shifts
            .iter()
            .map(|s| format!("{} {}\n", s.dx, s.dy))
            .collect()
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_text())?;
        Ok(())
    }
}

impl From<Vec<MotionShift>> for MotionShiftSequence {
    fn from(shifts: Vec<MotionShift>) -> Self {
        Self::new(shifts)
    }
}
