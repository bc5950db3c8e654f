//! 2-D point observation

use super::{Observation, ObservationKind};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A point in two dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Observation for Point {
    const KIND: ObservationKind = ObservationKind::Point;

    #[inline]
    fn distance(&self, other: &Self) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    fn aggregate(group: &[Self]) -> Option<Self> {
        if group.is_empty() {
            return None;
        }

        let (sum_x, sum_y) = group
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        let n = group.len() as f64;

        Some(Point::new(sum_x / n, sum_y / n))
    }

    fn dimension(&self) -> usize {
        2
    }
}

impl FromStr for Point {
    type Err = anyhow::Error;

    /// Parse `x,y`
    fn from_str(s: &str) -> anyhow::Result<Self> {
        let mut fields = s.split(',').map(str::trim);

        let x = fields
            .next()
            .filter(|f| !f.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Missing x coordinate in '{}'", s))?;
        let y = fields
            .next()
            .ok_or_else(|| anyhow::anyhow!("Missing y coordinate in '{}'", s))?;

        if fields.next().is_some() {
            anyhow::bail!("Expected 2 coordinates, got more in '{}'", s);
        }

        let x: f64 = x.parse()
            .with_context(|| format!("Invalid x coordinate '{}'", x))?;
        let y: f64 = y.parse()
            .with_context(|| format!("Invalid y coordinate '{}'", y))?;

        if !x.is_finite() || !y.is_finite() {
            anyhow::bail!("Coordinates must be finite, got '{}'", s);
        }

        Ok(Point::new(x, y))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_symmetric_and_zero_on_self() {
        let a = Point::new(1.0, 2.0);
        let b = Point::new(4.0, 6.0);

        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(b.distance(&a), 5.0);
        assert_eq!(a.distance(&a), 0.0);
    }

    #[test]
    fn test_aggregate_mean() {
        let group = vec![
            Point::new(10.0, 0.0),
            Point::new(10.0, 1.0),
        ];
        assert_eq!(Point::aggregate(&group), Some(Point::new(10.0, 0.5)));
    }

    #[test]
    fn test_aggregate_identical_group() {
        let p = Point::new(-3.25, 7.5);
        assert_eq!(Point::aggregate(&[p, p, p]), Some(p));
    }

    #[test]
    fn test_aggregate_empty() {
        assert_eq!(Point::aggregate(&[]), None);
    }

    #[test]
    fn test_parse_and_display() {
        let p: Point = " 1.5, -2 ".parse().unwrap();
        assert_eq!(p, Point::new(1.5, -2.0));

        let reparsed: Point = p.to_string().parse().unwrap();
        assert_eq!(reparsed, p);
    }

    #[test]
    fn test_parse_rejects_bad_lines() {
        assert!("1.0".parse::<Point>().is_err());
        assert!("1.0,2.0,3.0".parse::<Point>().is_err());
        assert!("a,2.0".parse::<Point>().is_err());
        assert!("NaN,2.0".parse::<Point>().is_err());
        assert!("".parse::<Point>().is_err());
    }
}
