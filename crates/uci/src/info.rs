//! Engine-to-GUI search info and option descriptors.

use serde::{Deserialize, Serialize};

/// Score in centipawns or mate distance, normalized to White's point of
/// view (the wire protocol reports scores from the side-to-move's
/// perspective; the worker flips the sign for Black before this is built).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Score {
    /// Centipawn score (100 = one pawn advantage for White).
    Cp(i32),
    /// Mate in N plies; positive favors White, negative favors Black.
    Mate(i32),
}

/// The fields of an `info` line this worker understands. Anything else
/// the engine sends (`multipv`, `currmove`, `currmovenumber`, `hashfull`,
/// `tbhits`, `sbhits`, `cpuload`) is recognized by the parser and dropped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchInfo {
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    pub score: Option<Score>,
    pub nodes: Option<u64>,
    pub nps: Option<u64>,
    pub time: Option<u64>,
    pub pv: Vec<String>,
}

const IGNORED_WITH_ARG: &[&str] = &["multipv", "currmove", "currmovenumber", "hashfull", "tbhits", "sbhits", "cpuload"];
const REST_OF_LINE_KEYWORDS: &[&str] = &["string", "refutation", "currline"];

impl SearchInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders as an `info ...` line (used by test doubles standing in for
    /// a real engine).
    pub fn to_uci(&self) -> String {
        let mut parts = vec!["info".to_string()];

        if let Some(d) = self.depth {
            parts.push(format!("depth {d}"));
        }
        if let Some(d) = self.seldepth {
            parts.push(format!("seldepth {d}"));
        }
        if let Some(s) = self.score {
            match s {
                Score::Cp(cp) => parts.push(format!("score cp {cp}")),
                Score::Mate(m) => parts.push(format!("score mate {m}")),
            }
        }
        if let Some(n) = self.nodes {
            parts.push(format!("nodes {n}"));
        }
        if let Some(n) = self.nps {
            parts.push(format!("nps {n}"));
        }
        if let Some(t) = self.time {
            parts.push(format!("time {t}"));
        }
        if !self.pv.is_empty() {
            parts.push(format!("pv {}", self.pv.join(" ")));
        }

        parts.join(" ")
    }

    /// Parses the body of an `info` line (tokens after the leading `info`
    /// keyword has already been stripped and confirmed not to be a bare
    /// `info string ...` line).
    pub fn parse(tokens: &[&str]) -> Self {
        let mut info = SearchInfo::new();
        let mut i = 0;

        while i < tokens.len() {
            match tokens[i] {
                "depth" => {
                    i += 1;
                    if i < tokens.len() {
                        info.depth = tokens[i].parse().ok();
                    }
                }
                "seldepth" => {
                    i += 1;
                    if i < tokens.len() {
                        info.seldepth = tokens[i].parse().ok();
                    }
                }
                "score" => {
                    i += 1;
                    if i < tokens.len() {
                        match tokens[i] {
                            "cp" => {
                                i += 1;
                                if i < tokens.len() {
                                    if let Ok(cp) = tokens[i].parse() {
                                        info.score = Some(Score::Cp(cp));
                                    }
                                }
                            }
                            "mate" => {
                                i += 1;
                                if i < tokens.len() {
                                    if let Ok(m) = tokens[i].parse() {
                                        info.score = Some(Score::Mate(m));
                                    }
                                }
                            }
                            _ => {}
                        }
                    }
                }
                "nodes" => {
                    i += 1;
                    if i < tokens.len() {
                        info.nodes = tokens[i].parse().ok();
                    }
                }
                "nps" => {
                    i += 1;
                    if i < tokens.len() {
                        info.nps = tokens[i].parse().ok();
                    }
                }
                "time" => {
                    i += 1;
                    if i < tokens.len() {
                        info.time = tokens[i].parse().ok();
                    }
                }
                "pv" => {
                    i += 1;
                    while i < tokens.len() && !is_info_keyword(tokens[i]) {
                        info.pv.push(tokens[i].to_string());
                        i += 1;
                    }
                    continue;
                }
                kw if IGNORED_WITH_ARG.contains(&kw) => {
                    i += 1; // skip the keyword's single argument
                }
                kw if REST_OF_LINE_KEYWORDS.contains(&kw) => break,
                _ => {}
            }
            i += 1;
        }

        info
    }
}

fn is_info_keyword(s: &str) -> bool {
    matches!(
        s,
        "depth" | "seldepth" | "score" | "nodes" | "nps" | "time" | "pv"
    ) || IGNORED_WITH_ARG.contains(&s)
        || REST_OF_LINE_KEYWORDS.contains(&s)
}

/// The declared type of an `option` descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    Check,
    Spin,
    Combo,
    Button,
    String,
}

/// A single `option ...` descriptor reported by the engine after `uci`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDescriptor {
    pub name: String,
    pub option_type: OptionType,
    pub default: Option<String>,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub vars: Vec<String>,
}

impl OptionDescriptor {
    /// Parses the body of an `option ...` line (tokens after `option`).
    pub fn parse(tokens: &[&str]) -> Option<Self> {
        let mut name_parts = Vec::new();
        let mut option_type = None;
        let mut default = None;
        let mut min = None;
        let mut max = None;
        let mut vars = Vec::new();

        let mut i = 0;
        while i < tokens.len() {
            match tokens[i] {
                "name" => {
                    i += 1;
                    while i < tokens.len() && !matches!(tokens[i], "type" | "default" | "min" | "max" | "var") {
                        name_parts.push(tokens[i]);
                        i += 1;
                    }
                    continue;
                }
                "type" => {
                    i += 1;
                    if i < tokens.len() {
                        option_type = match tokens[i] {
                            "check" => Some(OptionType::Check),
                            "spin" => Some(OptionType::Spin),
                            "combo" => Some(OptionType::Combo),
                            "button" => Some(OptionType::Button),
                            "string" => Some(OptionType::String),
                            _ => None,
                        };
                    }
                }
                "default" => {
                    i += 1;
                    let mut parts = Vec::new();
                    while i < tokens.len() && !matches!(tokens[i], "min" | "max" | "var") {
                        parts.push(tokens[i]);
                        i += 1;
                    }
                    if !parts.is_empty() {
                        default = Some(parts.join(" "));
                    }
                    continue;
                }
                "min" => {
                    i += 1;
                    if i < tokens.len() {
                        min = tokens[i].parse().ok();
                    }
                }
                "max" => {
                    i += 1;
                    if i < tokens.len() {
                        max = tokens[i].parse().ok();
                    }
                }
                "var" => {
                    i += 1;
                    if i < tokens.len() {
                        vars.push(tokens[i].to_string());
                    }
                }
                _ => {}
            }
            i += 1;
        }

        Some(OptionDescriptor {
            name: name_parts.join(" "),
            option_type: option_type?,
            default,
            min,
            max,
            vars,
        })
    }
}

/// Builder for constructing a [`SearchInfo`].
#[derive(Default)]
pub struct InfoBuilder {
    info: SearchInfo,
}

impl InfoBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(mut self, d: u32) -> Self {
        self.info.depth = Some(d);
        self
    }

    pub fn seldepth(mut self, d: u32) -> Self {
        self.info.seldepth = Some(d);
        self
    }

    pub fn score_cp(mut self, cp: i32) -> Self {
        self.info.score = Some(Score::Cp(cp));
        self
    }

    pub fn score_mate(mut self, moves: i32) -> Self {
        self.info.score = Some(Score::Mate(moves));
        self
    }

    pub fn nodes(mut self, n: u64) -> Self {
        self.info.nodes = Some(n);
        self
    }

    pub fn nps(mut self, n: u64) -> Self {
        self.info.nps = Some(n);
        self
    }

    pub fn time(mut self, ms: u64) -> Self {
        self.info.time = Some(ms);
        self
    }

    pub fn pv(mut self, moves: Vec<String>) -> Self {
        self.info.pv = moves;
        self
    }

    pub fn build(self) -> SearchInfo {
        self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_to_uci() {
        let info = InfoBuilder::new()
            .depth(10)
            .score_cp(35)
            .nodes(50000)
            .pv(vec!["e2e4".to_string(), "e7e5".to_string()])
            .build();

        let uci = info.to_uci();
        assert!(uci.contains("depth 10"));
        assert!(uci.contains("score cp 35"));
        assert!(uci.contains("nodes 50000"));
        assert!(uci.contains("pv e2e4 e7e5"));
    }

    #[test]
    fn parse_info_ignores_currmove_and_hashfull() {
        let line = "depth 12 score cp 30 currmove e2e4 currmovenumber 1 nodes 125000 nps 500000 hashfull 42 pv e2e4 e7e5 g1f3";
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let info = SearchInfo::parse(&tokens);

        assert_eq!(info.depth, Some(12));
        assert_eq!(info.score, Some(Score::Cp(30)));
        assert_eq!(info.nodes, Some(125000));
        assert_eq!(info.nps, Some(500000));
        assert_eq!(info.pv, vec!["e2e4", "e7e5", "g1f3"]);
    }

    #[test]
    fn parse_mate_score() {
        let line = "depth 20 score mate 3 pv e2e4";
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let info = SearchInfo::parse(&tokens);
        assert_eq!(info.score, Some(Score::Mate(3)));
    }

    #[test]
    fn parse_pv_stops_at_string_keyword() {
        let line = "depth 5 pv e2e4 e7e5 string this part is free text";
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let info = SearchInfo::parse(&tokens);
        assert_eq!(info.pv, vec!["e2e4", "e7e5"]);
    }

    #[test]
    fn option_descriptor_spin_roundtrip() {
        let line = "name Hash type spin default 16 min 1 max 33554432";
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let opt = OptionDescriptor::parse(&tokens).unwrap();
        assert_eq!(opt.name, "Hash");
        assert_eq!(opt.option_type, OptionType::Spin);
        assert_eq!(opt.default, Some("16".to_string()));
        assert_eq!(opt.min, Some(1));
        assert_eq!(opt.max, Some(33554432));
    }

    #[test]
    fn option_descriptor_combo_collects_vars() {
        let line = "name Style type combo default Normal var Solid var Normal var Risky";
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let opt = OptionDescriptor::parse(&tokens).unwrap();
        assert_eq!(opt.option_type, OptionType::Combo);
        assert_eq!(opt.vars, vec!["Solid", "Normal", "Risky"]);
    }
}
