//! Application Identifier metadata
//!
//! [`AiTable`] is the read-only provider the rest of the crate queries; it is
//! injected rather than global so tests can run against synthetic tables.
//! [`StaticAiTable::builtin`] covers the identification keys, their key
//! qualifiers and the attributes found on trade items and logistic units.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Role of an AI in a GS1 key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AiKind {
    /// Primary identification key (type `I`)
    Identifier,
    /// Key qualifier (type `Q`)
    Qualifier,
    /// Data attribute (type `D`)
    Data,
}

/// Characters a value may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Charset {
    /// Digits only
    Numeric,
    /// GS1 AI encodable character set 82
    Cset82,
    /// GS1 AI encodable character set 39
    Cset39,
}

const CSET82_PUNCTUATION: &str = "!\"%&'()*+,-./:;<=>?_";
const CSET39_PUNCTUATION: &str = "#-/";

impl Charset {
    pub fn allows(self, c: char) -> bool {
        match self {
            Charset::Numeric => c.is_ascii_digit(),
            Charset::Cset82 => c.is_ascii_alphanumeric() || CSET82_PUNCTUATION.contains(c),
            Charset::Cset39 => {
                c.is_ascii_digit() || c.is_ascii_uppercase() || CSET39_PUNCTUATION.contains(c)
            }
        }
    }
}

/// Metadata for one Application Identifier
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AiRecord {
    pub ai: String,
    pub label: String,
    pub kind: AiKind,
    /// Member of the GS1 predefined-length list: no FNC1 needed after it
    pub fixed_length: bool,
    pub min_length: usize,
    pub max_length: usize,
    pub charset: Charset,
    /// Length of the leading digit run that ends in a mod-10 check digit
    pub check_digit: Option<usize>,
    /// Convenience alpha accepted in Digital Link paths (`gtin`, `lot`, ...)
    pub short_name: Option<String>,
}

impl AiRecord {
    /// A variable-length CSET 82 field of up to 90 characters
    pub fn new(ai: impl Into<String>, label: impl Into<String>, kind: AiKind) -> Self {
        AiRecord {
            ai: ai.into(),
            label: label.into(),
            kind,
            fixed_length: false,
            min_length: 1,
            max_length: 90,
            charset: Charset::Cset82,
            check_digit: None,
            short_name: None,
        }
    }

    /// Exactly `len` digits
    pub fn numeric(mut self, len: usize) -> Self {
        self.charset = Charset::Numeric;
        self.min_length = len;
        self.max_length = len;
        self
    }

    /// Between `min` and `max` characters
    pub fn length(mut self, min: usize, max: usize) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    pub fn charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.fixed_length = true;
        self
    }

    pub fn check(mut self, span: usize) -> Self {
        self.check_digit = Some(span);
        self
    }

    pub fn short(mut self, name: impl Into<String>) -> Self {
        self.short_name = Some(name.into());
        self
    }
}

/// Read-only AI metadata provider
pub trait AiTable: Send + Sync {
    /// Metadata for an AI code
    fn lookup(&self, ai: &str) -> Option<&AiRecord>;

    /// Qualifiers of a primary identification key, in declared order
    fn qualifiers(&self, primary_ai: &str) -> Option<&[String]>;

    /// Metadata for a convenience alpha such as `gtin`
    fn lookup_short_name(&self, _name: &str) -> Option<&AiRecord> {
        None
    }
}

/// An [`AiTable`] held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticAiTable {
    records: Vec<AiRecord>,
    by_code: HashMap<String, usize>,
    by_short_name: HashMap<String, usize>,
    qualifiers: HashMap<String, Vec<String>>,
}

impl StaticAiTable {
    pub fn new<I, Q, S>(records: Vec<AiRecord>, qualifiers: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<Q>)>,
        S: Into<String>,
        Q: Into<String>,
    {
        let mut by_code = HashMap::new();
        let mut by_short_name = HashMap::new();
        for (idx, record) in records.iter().enumerate() {
            by_code.insert(record.ai.clone(), idx);
            if let Some(ref name) = record.short_name {
                by_short_name.insert(name.clone(), idx);
            }
        }
        let qualifiers = qualifiers
            .into_iter()
            .map(|(key, list)| (key.into(), list.into_iter().map(Into::into).collect()))
            .collect();
        StaticAiTable {
            records,
            by_code,
            by_short_name,
            qualifiers,
        }
    }

    /// The table shipped with the crate
    pub fn builtin() -> &'static StaticAiTable {
        &BUILTIN
    }

    pub fn records(&self) -> &[AiRecord] {
        &self.records
    }
}

impl AiTable for StaticAiTable {
    fn lookup(&self, ai: &str) -> Option<&AiRecord> {
        self.by_code.get(ai).map(|&idx| &self.records[idx])
    }

    fn qualifiers(&self, primary_ai: &str) -> Option<&[String]> {
        self.qualifiers.get(primary_ai).map(Vec::as_slice)
    }

    fn lookup_short_name(&self, name: &str) -> Option<&AiRecord> {
        self.by_short_name.get(name).map(|&idx| &self.records[idx])
    }
}

static BUILTIN: LazyLock<StaticAiTable> =
    LazyLock::new(|| StaticAiTable::new(builtin_records(), builtin_qualifiers()));

fn builtin_qualifiers() -> Vec<(&'static str, Vec<&'static str>)> {
    vec![
        ("01", vec!["22", "10", "21"]),
        ("8006", vec!["22", "10", "21"]),
        ("414", vec!["254", "7040"]),
        ("417", vec!["7040"]),
        ("8004", vec!["7040"]),
        ("8010", vec!["8011"]),
        ("8017", vec!["8019"]),
        ("8018", vec!["8019"]),
    ]
}

fn builtin_records() -> Vec<AiRecord> {
    use AiKind::{Data, Identifier, Qualifier};

    let mut records = vec![
        // Identification keys
        AiRecord::new("00", "SSCC", Identifier).numeric(18).fixed().check(18).short("sscc"),
        AiRecord::new("01", "GTIN", Identifier).numeric(14).fixed().check(14).short("gtin"),
        AiRecord::new("253", "GDTI", Identifier).length(13, 30).check(13).short("gdti"),
        AiRecord::new("255", "GCN", Identifier)
            .numeric(13)
            .length(13, 25)
            .check(13)
            .short("gcn"),
        AiRecord::new("401", "GINC", Identifier).length(1, 30).short("ginc"),
        AiRecord::new("402", "GSIN", Identifier).numeric(17).check(17).short("gsin"),
        AiRecord::new("414", "LOC No.", Identifier).numeric(13).fixed().check(13).short("gln"),
        AiRecord::new("417", "PARTY", Identifier).numeric(13).fixed().check(13).short("party"),
        AiRecord::new("8003", "GRAI", Identifier).length(14, 30).check(14).short("grai"),
        AiRecord::new("8004", "GIAI", Identifier).length(1, 30).short("giai"),
        AiRecord::new("8006", "ITIP", Identifier).numeric(18).check(14).short("itip"),
        AiRecord::new("8010", "CPID", Identifier)
            .length(1, 30)
            .charset(Charset::Cset39)
            .short("cpid"),
        AiRecord::new("8013", "GMN", Identifier).length(1, 25).short("gmn"),
        AiRecord::new("8017", "GSRN - PROVIDER", Identifier).numeric(18).check(18).short("gsrnp"),
        AiRecord::new("8018", "GSRN - RECIPIENT", Identifier).numeric(18).check(18).short("gsrn"),
        // Key qualifiers
        AiRecord::new("10", "BATCH/LOT", Qualifier).length(1, 20).short("lot"),
        AiRecord::new("21", "SERIAL", Qualifier).length(1, 20).short("ser"),
        AiRecord::new("22", "CPV", Qualifier).length(1, 20).short("cpv"),
        AiRecord::new("235", "TPX", Qualifier).length(1, 28),
        AiRecord::new("254", "GLN EXTENSION COMPONENT", Qualifier).length(1, 20).short("glnx"),
        AiRecord::new("7040", "UIC+EXT", Qualifier).length(4, 4),
        AiRecord::new("8011", "CPID SERIAL", Qualifier).numeric(12).length(1, 12).short("cpsn"),
        AiRecord::new("8019", "SRIN", Qualifier).numeric(10).length(1, 10).short("srin"),
        // Attributes
        AiRecord::new("02", "CONTENT", Data).numeric(14).fixed().check(14),
        AiRecord::new("11", "PROD DATE", Data).numeric(6).fixed(),
        AiRecord::new("12", "DUE DATE", Data).numeric(6).fixed(),
        AiRecord::new("13", "PACK DATE", Data).numeric(6).fixed(),
        AiRecord::new("15", "BEST BEFORE or BEST BY", Data).numeric(6).fixed(),
        AiRecord::new("16", "SELL BY", Data).numeric(6).fixed(),
        AiRecord::new("17", "USE BY OR EXPIRY", Data).numeric(6).fixed(),
        AiRecord::new("20", "VARIANT", Data).numeric(2).fixed(),
        AiRecord::new("30", "VAR. COUNT", Data).numeric(8).length(1, 8),
        AiRecord::new("37", "COUNT", Data).numeric(8).length(1, 8),
        AiRecord::new("240", "ADDITIONAL ID", Data).length(1, 30),
        AiRecord::new("241", "CUST. PART No.", Data).length(1, 30),
        AiRecord::new("242", "MTO VARIANT", Data).numeric(6).length(1, 6),
        AiRecord::new("250", "SECONDARY SERIAL", Data).length(1, 30),
        AiRecord::new("251", "REF. TO SOURCE", Data).length(1, 30),
        AiRecord::new("400", "ORDER NUMBER", Data).length(1, 30),
        AiRecord::new("403", "ROUTE", Data).length(1, 30),
        AiRecord::new("410", "SHIP TO LOC", Data).numeric(13).fixed().check(13),
        AiRecord::new("411", "BILL TO", Data).numeric(13).fixed().check(13),
        AiRecord::new("412", "PURCHASE FROM", Data).numeric(13).fixed().check(13),
        AiRecord::new("413", "SHIP FOR LOC", Data).numeric(13).fixed().check(13),
        AiRecord::new("415", "PAY TO", Data).numeric(13).fixed().check(13),
        AiRecord::new("416", "PROD/SERV LOC", Data).numeric(13).fixed().check(13),
        AiRecord::new("420", "SHIP TO POST", Data).length(1, 20),
        AiRecord::new("421", "SHIP TO POST", Data).length(4, 12),
        AiRecord::new("422", "ORIGIN", Data).numeric(3),
        AiRecord::new("423", "COUNTRY - INITIAL PROCESS.", Data).numeric(15).length(3, 15),
        AiRecord::new("424", "COUNTRY - PROCESS.", Data).numeric(3),
        AiRecord::new("425", "COUNTRY - DISASSEMBLY", Data).numeric(15).length(3, 15),
        AiRecord::new("426", "COUNTRY - FULL PROCESS", Data).numeric(3),
        AiRecord::new("427", "ORIGIN SUBDIVISION", Data).length(1, 3),
        AiRecord::new("243", "PCN", Data).length(1, 20),
        // Transport and logistics
        AiRecord::new("4300", "SHIP TO COMP", Data).length(1, 35),
        AiRecord::new("4301", "SHIP TO NAME", Data).length(1, 35),
        AiRecord::new("4302", "SHIP TO ADD1", Data).length(1, 70),
        AiRecord::new("4303", "SHIP TO ADD2", Data).length(1, 70),
        AiRecord::new("4304", "SHIP TO SUB", Data).length(1, 70),
        AiRecord::new("4305", "SHIP TO LOC", Data).length(1, 70),
        AiRecord::new("4306", "SHIP TO REG", Data).length(1, 70),
        AiRecord::new("4307", "SHIP TO COUNTRY", Data).length(2, 2),
        AiRecord::new("4308", "SHIP TO PHONE", Data).length(1, 30),
        AiRecord::new("4309", "SHIP TO GEO", Data).numeric(20),
        AiRecord::new("4310", "RTN TO COMP", Data).length(1, 35),
        AiRecord::new("4311", "RTN TO NAME", Data).length(1, 35),
        AiRecord::new("4312", "RTN TO ADD1", Data).length(1, 70),
        AiRecord::new("4313", "RTN TO ADD2", Data).length(1, 70),
        AiRecord::new("4314", "RTN TO SUB", Data).length(1, 70),
        AiRecord::new("4315", "RTN TO LOC", Data).length(1, 70),
        AiRecord::new("4316", "RTN TO REG", Data).length(1, 70),
        AiRecord::new("4317", "RTN TO COUNTRY", Data).length(2, 2),
        AiRecord::new("4318", "RTN TO POST", Data).length(1, 20),
        AiRecord::new("4319", "RTN TO PHONE", Data).length(1, 30),
        AiRecord::new("4320", "SRV DESCRIPTION", Data).length(1, 35),
        AiRecord::new("4321", "DANGEROUS GOODS", Data).numeric(1),
        AiRecord::new("4322", "AUTH LEAVE", Data).numeric(1),
        AiRecord::new("4323", "SIG REQUIRED", Data).numeric(1),
        AiRecord::new("4324", "NBEF DEL DT", Data).numeric(10),
        AiRecord::new("4325", "NAFT DEL DT", Data).numeric(10),
        AiRecord::new("4326", "REL DATE", Data).numeric(6),
        AiRecord::new("4330", "MAX TEMP F", Data).length(6, 7),
        AiRecord::new("4331", "MAX TEMP C", Data).length(6, 7),
        AiRecord::new("4332", "MIN TEMP F", Data).length(6, 7),
        AiRecord::new("4333", "MIN TEMP C", Data).length(6, 7),
        // Supply chain and healthcare
        AiRecord::new("7001", "NSN", Data).numeric(13),
        AiRecord::new("7002", "MEAT CUT", Data).length(1, 30),
        AiRecord::new("7003", "EXPIRY TIME", Data).numeric(10),
        AiRecord::new("7004", "ACTIVE POTENCY", Data).numeric(4).length(1, 4),
        AiRecord::new("7005", "CATCH AREA", Data).length(1, 12),
        AiRecord::new("7006", "FIRST FREEZE DATE", Data).numeric(6),
        AiRecord::new("7007", "HARVEST DATE", Data).numeric(12).length(6, 12),
        AiRecord::new("7008", "AQUATIC SPECIES", Data).length(1, 3),
        AiRecord::new("7009", "FISHING GEAR TYPE", Data).length(1, 10),
        AiRecord::new("7010", "PROD METHOD", Data).length(1, 2),
        AiRecord::new("7240", "PROTOCOL", Data).length(1, 20),
        AiRecord::new("8001", "DIMENSIONS", Data).numeric(14),
        AiRecord::new("8002", "CMT No.", Data).length(1, 20),
        AiRecord::new("8005", "PRICE PER UNIT", Data).numeric(6),
        AiRecord::new("8007", "IBAN", Data).length(1, 34),
        AiRecord::new("8008", "PROD TIME", Data).numeric(12).length(8, 12),
        AiRecord::new("8009", "OPTSEN", Data).length(1, 50),
        AiRecord::new("8012", "VERSION", Data).length(1, 20),
        AiRecord::new("8020", "REF No.", Data).length(1, 25),
        AiRecord::new("8026", "ITIP CONTENT", Data).numeric(18).check(14),
        AiRecord::new("8110", "-", Data).length(1, 70),
        AiRecord::new("8111", "POINTS", Data).numeric(4),
        AiRecord::new("8112", "-", Data).length(1, 70),
        AiRecord::new("8200", "PRODUCT URL", Data).length(1, 70),
        AiRecord::new("90", "INTERNAL", Data).length(1, 30),
    ];

    // Measures: 3nnd, d = implied decimal places
    let measures = [
        ("310", "NET WEIGHT (kg)"),
        ("311", "LENGTH (m)"),
        ("312", "WIDTH (m)"),
        ("313", "HEIGHT (m)"),
        ("314", "AREA (m2)"),
        ("315", "NET VOLUME (l)"),
        ("316", "NET VOLUME (m3)"),
        ("320", "NET WEIGHT (lb)"),
        ("321", "LENGTH (in)"),
        ("322", "LENGTH (ft)"),
        ("323", "LENGTH (yd)"),
        ("324", "WIDTH (in)"),
        ("325", "WIDTH (ft)"),
        ("326", "WIDTH (yd)"),
        ("327", "HEIGHT (in)"),
        ("328", "HEIGHT (ft)"),
        ("329", "HEIGHT (yd)"),
        ("330", "GROSS WEIGHT (kg)"),
        ("331", "LENGTH (m), log"),
        ("332", "WIDTH (m), log"),
        ("333", "HEIGHT (m), log"),
        ("334", "AREA (m2), log"),
        ("335", "VOLUME (l), log"),
        ("336", "VOLUME (m3), log"),
        ("337", "KG PER m2"),
        ("340", "GROSS WEIGHT (lb)"),
        ("341", "LENGTH (in), log"),
        ("342", "LENGTH (ft), log"),
        ("343", "LENGTH (yd), log"),
        ("344", "WIDTH (in), log"),
        ("345", "WIDTH (ft), log"),
        ("346", "WIDTH (yd), log"),
        ("347", "HEIGHT (in), log"),
        ("348", "HEIGHT (ft), log"),
        ("349", "HEIGHT (yd), log"),
        ("350", "AREA (in2)"),
        ("351", "AREA (ft2)"),
        ("352", "AREA (yd2)"),
        ("353", "AREA (in2), log"),
        ("354", "AREA (ft2), log"),
        ("355", "AREA (yd2), log"),
        ("356", "NET WEIGHT (troy oz)"),
        ("357", "NET VOLUME (oz)"),
        ("360", "NET VOLUME (qt)"),
        ("361", "NET VOLUME (gal.)"),
        ("362", "VOLUME (qt), log"),
        ("363", "VOLUME (gal.), log"),
        ("364", "VOLUME (in3)"),
        ("365", "VOLUME (ft3)"),
        ("366", "VOLUME (yd3)"),
        ("367", "VOLUME (in3), log"),
        ("368", "VOLUME (ft3), log"),
        ("369", "VOLUME (yd3), log"),
    ];
    for (prefix, label) in measures {
        for n in 0..=5 {
            records.push(AiRecord::new(format!("{}{}", prefix, n), label, Data).numeric(6).fixed());
        }
    }
    for n in 0..=9 {
        records.push(AiRecord::new(format!("392{}", n), "PRICE", Data).numeric(15).length(1, 15));
    }
    for n in 91..=99 {
        records.push(AiRecord::new(n.to_string(), "INTERNAL", Data).length(1, 90));
    }

    records
}
