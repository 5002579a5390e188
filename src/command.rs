// src/command.rs - Line protocol turning operator input into motion requests
use thiserror::Error;

use crate::motion::MotionRequest;
use crate::motion::model::ArmVariant;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Motion(MotionRequest),
    /// Report the current joint and cartesian pose.
    Debug,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,
    #[error("Unknown command '{0}'")]
    Unknown(char),
    #[error("Missing field '{0}'")]
    MissingField(char),
    #[error("Field '{0}' out of order")]
    FieldOrder(char),
    #[error("Unexpected text '{0}' before first field")]
    Unexpected(String),
    #[error("Invalid number '{value}' for field '{field}'")]
    InvalidNumber { field: char, value: String },
}

/// Parser for the single-letter command set of one arm variant.
///
/// `i` interpolates (joint or cartesian goal), `l` draws a line, `c` draws
/// a circle, `d` reports the pose. Fields are `<letter><number>` and must
/// appear in order.
#[derive(Debug, Clone)]
pub struct CommandParser {
    variant: ArmVariant,
}

impl CommandParser {
    pub fn new(variant: ArmVariant) -> Self {
        Self { variant }
    }

    pub fn variant(&self) -> ArmVariant {
        self.variant
    }

    pub fn parse_line(&self, line: &str) -> Result<Command, CommandError> {
        let line = line.trim();
        let mut chars = line.chars();
        let Some(letter) = chars.next() else {
            return Err(CommandError::Empty);
        };
        let body = chars.as_str().trim();

        match letter {
            'i' => {
                if body.starts_with('x') {
                    let target = self.parse_point(body)?;
                    Ok(Command::Motion(MotionRequest::InterpolateToCartesian(target)))
                } else {
                    let angles = parse_fields(body, self.variant.joint_letters())?;
                    Ok(Command::Motion(MotionRequest::InterpolateToJoint(angles)))
                }
            }
            'l' => {
                let target = self.parse_point(body)?;
                Ok(Command::Motion(MotionRequest::LineTo(target)))
            }
            'c' => {
                let vertical = self.vertical_letter();
                let values = parse_fields(body, &['r', 'x', vertical])?;
                Ok(Command::Motion(MotionRequest::CircleAt {
                    radius: values[0],
                    center_x: values[1],
                    center_z: values[2],
                }))
            }
            'd' => Ok(Command::Debug),
            other => Err(CommandError::Unknown(other)),
        }
    }

    /// Cartesian point. The planar arm takes `x<x>y<height>` in its own plane.
    fn parse_point(&self, body: &str) -> Result<[f64; 3], CommandError> {
        match self.variant {
            ArmVariant::YawPlanar => {
                let v = parse_fields(body, &['x', 'y', 'z'])?;
                Ok([v[0], v[1], v[2]])
            }
            ArmVariant::Planar => {
                let v = parse_fields(body, &['x', 'y'])?;
                Ok([v[0], 0.0, v[1]])
            }
        }
    }

    fn vertical_letter(&self) -> char {
        match self.variant {
            ArmVariant::YawPlanar => 'z',
            ArmVariant::Planar => 'y',
        }
    }

    /// Reply sent back when a line fails to parse.
    pub fn usage_for(&self, line: &str) -> String {
        let (joint, point, circle) = self.formats();
        match line.trim().chars().next() {
            Some('i') => format!("Invalid interpolation format. Use: i{} or i{}", joint, point),
            Some('l') => format!("Invalid line format. Use: l{}", point),
            Some('c') => format!("Invalid circle format. Use: c{}", circle),
            _ => "Unknown command. Use one of: i, l, c, d".to_string(),
        }
    }

    /// Banner printed at startup.
    pub fn help(&self) -> Vec<String> {
        let (joint, point, circle) = self.formats();
        vec![
            "Available commands:".to_string(),
            format!("Interpolation: i{} or i{}", joint, point),
            format!("Line: l{}", point),
            format!("Circle: c{}", circle),
            "Debug: d".to_string(),
        ]
    }

    fn formats(&self) -> (&'static str, &'static str, &'static str) {
        match self.variant {
            ArmVariant::YawPlanar => (
                "t<theta>a<alpha>b<beta>",
                "x<x>y<y>z<z>",
                "r<radius>x<center_x>z<center_z>",
            ),
            ArmVariant::Planar => ("a<alpha>b<beta>", "x<x>y<z>", "r<radius>x<center_x>y<center_z>"),
        }
    }
}

/// Extracts `<marker><number>` fields in the given order.
fn parse_fields(body: &str, markers: &[char]) -> Result<Vec<f64>, CommandError> {
    let mut positions = Vec::with_capacity(markers.len());
    let mut cursor = 0;
    for &marker in markers {
        match body[cursor..].find(marker) {
            Some(offset) => {
                let at = cursor + offset;
                positions.push(at);
                cursor = at + marker.len_utf8();
            }
            None if body.contains(marker) => return Err(CommandError::FieldOrder(marker)),
            None => return Err(CommandError::MissingField(marker)),
        }
    }

    let leading = body[..positions[0]].trim();
    if !leading.is_empty() {
        return Err(CommandError::Unexpected(leading.to_string()));
    }

    let mut values = Vec::with_capacity(markers.len());
    for (i, &marker) in markers.iter().enumerate() {
        let from = positions[i] + marker.len_utf8();
        let to = positions.get(i + 1).copied().unwrap_or(body.len());
        let raw = body[from..to].trim();
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => values.push(value),
            _ => {
                return Err(CommandError::InvalidNumber {
                    field: marker,
                    value: raw.to_string(),
                });
            }
        }
    }
    Ok(values)
}
