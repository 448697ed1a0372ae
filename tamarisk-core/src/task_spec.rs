//! Parser for RL-Glue 3.0 task specification strings.
//!
//! A task spec looks like
//! `VERSION RL-Glue-3.0 PROBLEMTYPE episodic DISCOUNTFACTOR 0.9 OBSERVATIONS INTS (28 1 3)
//! ACTIONS INTS (7 1 4) REWARDS (-10000.0 0.0) EXTRA ...`. Only the canonical section order
//! written by the RL-Glue codecs is accepted.

use crate::{error::ConfigError, rng::RiverShape};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_till1, take_until},
    character::complete::{char, multispace0, multispace1, space0, u32 as uint},
    combinator::{map, opt, rest},
    multi::{many0, many1, separated_list1},
    number::complete::double,
    sequence::{delimited, preceded, separated_pair},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Value(f64),
    Unspecified,
    NegInf,
    PosInf,
}

/// `count` consecutive dimensions sharing the same bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub count: usize,
    pub min: Bound,
    pub max: Bound,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dimensions {
    pub ints: Vec<Range>,
    pub doubles: Vec<Range>,
    pub char_count: usize,
}

impl Dimensions {
    pub fn int_count(&self) -> usize {
        self.ints.iter().map(|r| r.count).sum()
    }

    pub fn double_count(&self) -> usize {
        self.doubles.iter().map(|r| r.count).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskSpec {
    pub version: String,
    pub problem_type: String,
    pub discount_factor: f64,
    pub observations: Dimensions,
    pub actions: Dimensions,
    pub rewards: Range,
    pub extra: String,
}

fn token(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c.is_whitespace()).parse(input)
}

fn keyword<'a>(
    name: &'static str,
) -> impl Parser<&'a str, Output = &'a str, Error = nom::error::Error<&'a str>> {
    preceded(multispace0, tag(name))
}

fn bound(input: &str) -> IResult<&str, Bound> {
    alt((
        map(tag("UNSPEC"), |_| Bound::Unspecified),
        map(tag("NEGINF"), |_| Bound::NegInf),
        map(tag("POSINF"), |_| Bound::PosInf),
        map(double, Bound::Value),
    ))
    .parse(input)
}

fn range(input: &str) -> IResult<&str, Range> {
    let (input, _) = preceded(multispace0, char('(')).parse(input)?;
    let (input, values) =
        delimited(multispace0, separated_list1(multispace1, bound), multispace0).parse(input)?;
    let (input, _) = char(')').parse(input)?;
    let range = match values.as_slice() {
        [min, max] => Range {
            count: 1,
            min: *min,
            max: *max,
        },
        [Bound::Value(count), min, max] if *count >= 0. && count.fract() == 0. => Range {
            count: *count as usize,
            min: *min,
            max: *max,
        },
        _ => {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Verify,
            )));
        }
    };
    Ok((input, range))
}

fn dimensions(input: &str) -> IResult<&str, Dimensions> {
    let (input, ints) = opt(preceded(keyword("INTS"), many1(range))).parse(input)?;
    let (input, doubles) = opt(preceded(keyword("DOUBLES"), many1(range))).parse(input)?;
    let (input, char_count) =
        opt(preceded((keyword("CHARCOUNT"), multispace1), uint)).parse(input)?;
    Ok((
        input,
        Dimensions {
            ints: ints.unwrap_or_default(),
            doubles: doubles.unwrap_or_default(),
            char_count: char_count.unwrap_or_default() as usize,
        },
    ))
}

fn task_spec(input: &str) -> IResult<&str, TaskSpec> {
    let (input, version) = preceded((keyword("VERSION"), multispace1), token).parse(input)?;
    let (input, problem_type) =
        preceded((keyword("PROBLEMTYPE"), multispace1), token).parse(input)?;
    let (input, discount_factor) =
        preceded((keyword("DISCOUNTFACTOR"), multispace1), double).parse(input)?;
    let (input, observations) = preceded(keyword("OBSERVATIONS"), dimensions).parse(input)?;
    let (input, actions) = preceded(keyword("ACTIONS"), dimensions).parse(input)?;
    let (input, rewards) = preceded(keyword("REWARDS"), range).parse(input)?;
    let (input, extra) = opt(preceded((keyword("EXTRA"), space0), rest)).parse(input)?;
    Ok((
        input,
        TaskSpec {
            version: version.to_owned(),
            problem_type: problem_type.to_owned(),
            discount_factor,
            observations,
            actions,
            rewards,
            extra: extra.unwrap_or_default().trim().to_owned(),
        },
    ))
}

fn edge(input: &str) -> IResult<&str, (u32, u32)> {
    delimited(
        char('('),
        separated_pair(uint, (char(','), space0), uint),
        char(')'),
    )
    .parse(input)
}

fn edges(input: &str) -> IResult<&str, Vec<(u32, u32)>> {
    many0(preceded(take_until("("), edge)).parse(input)
}

fn budget(input: &str) -> IResult<&str, f64> {
    preceded((take_until(" BUDGET "), tag(" BUDGET "), space0), double).parse(input)
}

impl TaskSpec {
    pub fn parse(input: &str) -> Result<Self, String> {
        match task_spec(input.trim()) {
            Ok((_, spec)) => Ok(spec),
            Err(err) => Err(err.to_string()),
        }
    }

    /// River edges as `(child, parent)` reach indices from the EXTRA section.
    pub fn river_edges(&self) -> Vec<(u32, u32)> {
        let edge_part = match self.extra.find(" BUDGET ") {
            Some(idx) => &self.extra[..idx],
            None => self.extra.as_str(),
        };
        edges(edge_part).map(|(_, edges)| edges).unwrap_or_default()
    }

    /// Per step action budget announced in the EXTRA section.
    pub fn budget(&self) -> Option<f64> {
        // the leading space is part of the marker
        let extra = format!(" {}", self.extra);
        budget(&extra).ok().map(|(_, budget)| budget)
    }

    /// Checks a configured river against the dimensions the environment declares.
    pub fn check_shape(&self, shape: &RiverShape) -> Result<(), ConfigError> {
        let observed = self.observations.int_count();
        if observed > 0 && observed != shape.habitats() {
            return Err(ConfigError::HabitatCountMismatch {
                observed,
                configured: shape.habitats(),
            });
        }
        let observed = self.actions.int_count();
        if observed > 0 && observed != shape.reaches() {
            return Err(ConfigError::ReachCountMismatch {
                observed,
                configured: shape.reaches(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{Bound, Range, TaskSpec};
    use crate::{error::ConfigError, rng::RiverShape};

    const INVASIVE: &str = "VERSION RL-Glue-3.0 PROBLEMTYPE episodic DISCOUNTFACTOR 0.9 \
        OBSERVATIONS INTS (28 1 3) ACTIONS INTS (7 1 4) REWARDS (-10000.0 0.0) \
        EXTRA [(0, 1), (1, 2), (2, 3), (3, 4), (5, 4), (6, 5)] BUDGET 20 by Majid Taleghan";

    #[test]
    fn parses_invasive_species_spec() {
        let spec = TaskSpec::parse(INVASIVE).unwrap();
        assert_eq!(spec.version, "RL-Glue-3.0");
        assert_eq!(spec.problem_type, "episodic");
        assert_eq!(spec.discount_factor, 0.9);
        assert_eq!(spec.observations.int_count(), 28);
        assert_eq!(spec.actions.int_count(), 7);
        assert_eq!(
            spec.rewards,
            Range {
                count: 1,
                min: Bound::Value(-10000.),
                max: Bound::Value(0.)
            }
        );
        assert_eq!(spec.budget(), Some(20.));
        assert_eq!(spec.river_edges().len(), 6);
        assert_eq!(spec.river_edges()[4], (5, 4));
    }

    #[test]
    fn parses_mixed_dimensions() {
        let spec = TaskSpec::parse(
            "VERSION RL-Glue-3.0 PROBLEMTYPE continuing DISCOUNTFACTOR 1 \
             OBSERVATIONS INTS (3 0 1) (0 4) DOUBLES (2 -1.2 0.5) (-.07 .07) CHARCOUNT 1024 \
             ACTIONS INTS (0 4) REWARDS (-5.0 UNSPEC) EXTRA",
        )
        .unwrap();
        assert_eq!(spec.observations.int_count(), 4);
        assert_eq!(spec.observations.double_count(), 3);
        assert_eq!(spec.observations.char_count, 1024);
        assert_eq!(spec.rewards.max, Bound::Unspecified);
        assert_eq!(spec.extra, "");
        assert_eq!(spec.budget(), None);
    }

    #[test]
    fn rejects_garbage() {
        assert!(TaskSpec::parse("").is_err());
        assert!(TaskSpec::parse("invasive species").is_err());
    }

    #[test]
    fn shape_must_match_declared_dimensions() {
        let spec = TaskSpec::parse(INVASIVE).unwrap();
        assert_eq!(spec.check_shape(&RiverShape::new(7, 4).unwrap()), Ok(()));
        assert_eq!(
            spec.check_shape(&RiverShape::new(7, 3).unwrap()),
            Err(ConfigError::HabitatCountMismatch {
                observed: 28,
                configured: 21
            })
        );
        assert_eq!(
            spec.check_shape(&RiverShape::new(4, 7).unwrap()),
            Err(ConfigError::ReachCountMismatch {
                observed: 7,
                configured: 4
            })
        );
    }
}
