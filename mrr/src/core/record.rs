//! The run's result record: a fixed, ordered set of named fields.
//!
//! The record renders to exactly two lines (header and data row, both
//! comma-separated). External collaborators rewrite the same file, so parsing
//! tolerates whitespace around entries and a single trailing empty column.

use std::fmt;

use anyhow::{Result, anyhow, bail};

/// Value written to `maxsat_result` until a later stage overwrites it.
pub const ENCODING_ERROR: &str = "ENCODING_ERROR";

/// Numeric sentinel for fields not yet known.
pub const UNSET: i64 = -1;

/// Field identifiers, in on-disk column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    DomainName,
    ProblemName,
    PlanFile,
    Alg,
    Acyc,
    Asymm,
    TimeLimit,
    EncTime,
    PreproTime,
    MaxsatTime,
    NProps,
    NClauses,
    NSymmProps,
    NSymmClauses,
    MaxsatResult,
    PopSize,
    PopFlex,
}

impl Field {
    pub const ALL: [Field; 17] = [
        Field::DomainName,
        Field::ProblemName,
        Field::PlanFile,
        Field::Alg,
        Field::Acyc,
        Field::Asymm,
        Field::TimeLimit,
        Field::EncTime,
        Field::PreproTime,
        Field::MaxsatTime,
        Field::NProps,
        Field::NClauses,
        Field::NSymmProps,
        Field::NSymmClauses,
        Field::MaxsatResult,
        Field::PopSize,
        Field::PopFlex,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::DomainName => "domain_name",
            Field::ProblemName => "problem_name",
            Field::PlanFile => "plan_file",
            Field::Alg => "alg",
            Field::Acyc => "acyc",
            Field::Asymm => "asymm",
            Field::TimeLimit => "time_limit",
            Field::EncTime => "enc_time",
            Field::PreproTime => "prepro_time",
            Field::MaxsatTime => "maxsat_time",
            Field::NProps => "n_props",
            Field::NClauses => "n_clauses",
            Field::NSymmProps => "n_symm_props",
            Field::NSymmClauses => "n_symm_clauses",
            Field::MaxsatResult => "maxsat_result",
            Field::PopSize => "pop_size",
            Field::PopFlex => "pop_flex",
        }
    }

    /// Column index in the header.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|field| field.name() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inputs known before any stage runs.
#[derive(Debug, Clone)]
pub struct RecordSeed<'a> {
    pub domain: &'a str,
    pub problem: &'a str,
    pub plan: &'a str,
    pub algorithm: &'a str,
    pub time_limit_ms: i64,
}

/// One value per [`Field`], kept in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    values: Vec<String>,
}

impl ResultRecord {
    /// Fresh record with sentinels for everything not yet known.
    pub fn new(seed: &RecordSeed<'_>) -> Self {
        let mut record = Self {
            values: vec![UNSET.to_string(); Field::ALL.len()],
        };
        record.set(Field::DomainName, seed.domain);
        record.set(Field::ProblemName, seed.problem);
        record.set(Field::PlanFile, seed.plan);
        record.set(Field::Alg, seed.algorithm);
        record.set(Field::Acyc, "");
        record.set(Field::Asymm, "");
        record.set(Field::TimeLimit, seed.time_limit_ms);
        record.set(Field::MaxsatResult, ENCODING_ERROR);
        record
    }

    pub fn get(&self, field: Field) -> &str {
        &self.values[field.index()]
    }

    /// Replace one value. Separators and line breaks are flattened to spaces.
    pub fn set(&mut self, field: Field, value: impl fmt::Display) {
        self.values[field.index()] = sanitize(&value.to_string());
    }

    /// Replace one value by its header name.
    pub fn set_named(&mut self, name: &str, value: impl fmt::Display) -> Result<Field> {
        let field = Field::from_name(name)
            .ok_or_else(|| anyhow!("cannot write result record: header {name} not found"))?;
        self.set(field, value);
        Ok(field)
    }

    pub fn header_line() -> String {
        Field::ALL
            .iter()
            .map(|field| field.name())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn data_line(&self) -> String {
        self.values.join(",")
    }

    /// Header and data line, each terminated by a newline.
    pub fn render(&self) -> String {
        format!("{}\n{}\n", Self::header_line(), self.data_line())
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let mut lines = contents.lines().filter(|line| !line.trim().is_empty());
        let header = lines.next().ok_or_else(|| anyhow!("missing header line"))?;
        let data = lines.next().ok_or_else(|| anyhow!("missing data line"))?;
        if lines.next().is_some() {
            bail!("expected exactly two lines");
        }

        let names = split_columns(header);
        let expected: Vec<&str> = Field::ALL.iter().map(|field| field.name()).collect();
        if names != expected {
            bail!("unexpected header: {}", header.trim());
        }

        let values = split_columns(data);
        if values.len() != Field::ALL.len() {
            bail!(
                "expected {} values, found {}",
                Field::ALL.len(),
                values.len()
            );
        }

        Ok(Self {
            values: values.into_iter().map(str::to_string).collect(),
        })
    }
}

fn split_columns(line: &str) -> Vec<&str> {
    let mut columns: Vec<&str> = line.split(',').map(str::trim).collect();
    if columns.len() > Field::ALL.len() && columns.last() == Some(&"") {
        columns.pop();
    }
    columns
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|ch| if matches!(ch, ',' | '\n' | '\r') { ' ' } else { ch })
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> RecordSeed<'static> {
        RecordSeed {
            domain: "logistics/domain.pddl",
            problem: "logistics/p01.pddl",
            plan: "logistics/p01.pddl.m",
            algorithm: "MRR",
            time_limit_ms: 1_800_000,
        }
    }

    #[test]
    fn new_record_uses_sentinels() {
        let record = ResultRecord::new(&seed());
        assert_eq!(
            record.data_line(),
            "logistics/domain.pddl,logistics/p01.pddl,logistics/p01.pddl.m,MRR,,,1800000,-1,-1,-1,-1,-1,-1,-1,ENCODING_ERROR,-1,-1"
        );
    }

    #[test]
    fn header_names_every_field_in_order() {
        assert_eq!(
            ResultRecord::header_line(),
            "domain_name,problem_name,plan_file,alg,acyc,asymm,time_limit,enc_time,prepro_time,maxsat_time,n_props,n_clauses,n_symm_props,n_symm_clauses,maxsat_result,pop_size,pop_flex"
        );
    }

    #[test]
    fn field_names_round_trip() {
        for (index, field) in Field::ALL.iter().enumerate() {
            assert_eq!(field.index(), index);
            assert_eq!(Field::from_name(field.name()), Some(*field));
        }
        assert_eq!(Field::from_name("runtime"), None);
    }

    #[test]
    fn parse_accepts_rendered_record() {
        let mut record = ResultRecord::new(&seed());
        record.set(Field::EncTime, 1234);
        let parsed = ResultRecord::parse(&record.render()).expect("parse");
        assert_eq!(parsed, record);
    }

    #[test]
    fn parse_tolerates_padding_and_trailing_commas() {
        let header = Field::ALL
            .iter()
            .map(|field| format!("{}, ", field.name()))
            .collect::<String>();
        let contents = format!(
            "{header}\nlogistics,p01,p01.pddl.m,MRR,ATOM,NONE,1800000,812,0,0,120,4410,0,0,null,-1,-1.000\n"
        );
        let parsed = ResultRecord::parse(&contents).expect("parse");
        assert_eq!(parsed.get(Field::NClauses), "4410");
        assert_eq!(parsed.get(Field::PopFlex), "-1.000");
        assert_eq!(parsed.get(Field::MaxsatResult), "null");
    }

    #[test]
    fn parse_rejects_wrong_shapes() {
        let record = ResultRecord::new(&seed());
        assert!(ResultRecord::parse("").is_err());
        assert!(ResultRecord::parse(&ResultRecord::header_line()).is_err());

        let short = format!("{}\na,b,c\n", ResultRecord::header_line());
        let err = ResultRecord::parse(&short).unwrap_err();
        assert!(err.to_string().contains("expected 17 values"));

        let renamed = record.render().replacen("enc_time", "encode_ms", 1);
        let err = ResultRecord::parse(&renamed).unwrap_err();
        assert!(err.to_string().contains("unexpected header"));
    }

    #[test]
    fn set_flattens_separators() {
        let mut record = ResultRecord::new(&seed());
        record.set(Field::PlanFile, "plans/a,b\nc");
        assert_eq!(record.get(Field::PlanFile), "plans/a b c");
        assert_eq!(record.data_line().split(',').count(), Field::ALL.len());
    }

    #[test]
    fn set_named_rejects_unknown_field() {
        let mut record = ResultRecord::new(&seed());
        let field = record.set_named("prepro_time", 55).expect("known field");
        assert_eq!(field, Field::PreproTime);
        assert_eq!(record.get(Field::PreproTime), "55");

        let err = record.set_named("runtime", 1).unwrap_err();
        assert!(err.to_string().contains("header runtime not found"));
    }
}
