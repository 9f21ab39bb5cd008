//! Cache dump and load.
//!
//! The machine-readable formats (JSON, YAML) carry a container with
//! the crate version, the profile's operation costs, and one product
//! record per multiplier that has a known sequence. The text dump is
//! for humans: one fixed-width line per entry with the bounds, plus
//! the hit/miss statistics. The TSV dump is for spreadsheets.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::cache::MultCache;
use crate::cpu::{Cost, CpuProfile};
use crate::error::Error;
use crate::instruction::{parse_sequence, sequence_to_string};

pub const SEARCH_COMPLETED: &str = "completed";
pub const SEARCH_UPPER_BOUND: &str = "upper-bound";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProductRecord {
    pub cost: Cost,
    #[serde(rename = "search-status")]
    pub search_status: String,
    pub sequence: String,
}

/// Serialisable view of a cache: version, profile costs, and the
/// products with a known sequence, keyed by multiplier.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheDump {
    pub version: String,
    pub costs: BTreeMap<String, Cost>,
    pub products: BTreeMap<i64, ProductRecord>,
}

/// Reorganise a cache into the machine-readable container. Entries
/// without instructions or without a finite upper bound (materialised
/// defaults, pure lower bounds) are unreached and left out.
pub fn reformat_cache(cache: &MultCache) -> CacheDump {
    let mut products = BTreeMap::new();
    for (num, entry) in cache.iter() {
        if entry.instrs.is_empty() || entry.upper.is_infinite() {
            continue;
        }
        products.insert(
            *num,
            ProductRecord {
                cost: entry.upper,
                search_status: if entry.finished {
                    SEARCH_COMPLETED.to_string()
                } else {
                    SEARCH_UPPER_BOUND.to_string()
                },
                sequence: sequence_to_string(&entry.instrs),
            },
        );
    }
    CacheDump {
        version: env!("CARGO_PKG_VERSION").to_string(),
        costs: profile_costs(&cache.profile),
        products,
    }
}

/// The profile's finite operation costs as a name -> cost map;
/// absent operations are omitted rather than written as infinities.
fn profile_costs(profile: &CpuProfile) -> BTreeMap<String, Cost> {
    let costs = &profile.costs;
    let mut map = BTreeMap::new();
    for (name, cost) in [
        ("add", costs.add),
        ("copy", costs.copy),
        ("eps", costs.eps),
        ("negate", costs.negate),
        ("nop", costs.nop),
        ("shift", costs.shift),
        ("subtract", costs.subtract),
        ("zero", costs.zero),
    ] {
        if cost.is_finite() {
            map.insert(name.to_string(), cost);
        }
    }
    map
}

/// Human-readable dump: bounds per entry plus the statistics.
/// Finished entries show a flat cost; unfinished ones show the
/// half-open `(lower,upper]` interval still being narrowed.
pub fn dump<W: Write>(cache: &MultCache, out: &mut W) -> Result<(), Error> {
    for (num, entry) in cache.iter() {
        let cache_str = if entry.finished {
            format!("cost: {:7}", entry.upper)
        } else if entry.upper.is_finite() {
            format!("cost: ({},{:4}]", entry.lower, entry.upper)
        } else {
            format!("cost: ({},{:<4}]", entry.lower, "inf")
        };
        writeln!(
            out,
            "{:4}: {};\t{}",
            num,
            cache_str,
            sequence_to_string(&entry.instrs)
        )?;
    }
    writeln!(out)?;
    writeln!(out, "Cache hits (finished):\t\t{:4}", cache.hits_exact)?;
    writeln!(out, "Cache hits (unfinished):\t{:4}", cache.hits_partial)?;
    writeln!(out, "Cache misses:\t\t\t{:4}", cache.misses)?;
    writeln!(out, "{}", "=".repeat(60))?;
    Ok(())
}

/// Tab-separated dump of the reached products.
pub fn dump_tsv<W: Write>(cache: &MultCache, out: &mut W) -> Result<(), Error> {
    writeln!(out, "n\tcost\tsearch-status\tsequence")?;
    for (num, record) in reformat_cache(cache).products {
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            num, record.cost, record.search_status, record.sequence
        )?;
    }
    Ok(())
}

pub fn dump_json<W: Write>(cache: &MultCache, out: &mut W) -> Result<(), Error> {
    let table = reformat_cache(cache);
    serde_json::to_writer_pretty(&mut *out, &table)
        .map_err(|e| Error::Parse(format!("cannot encode cache as JSON: {}", e)))?;
    writeln!(out)?;
    Ok(())
}

pub fn dump_yaml<W: Write>(cache: &MultCache, out: &mut W) -> Result<(), Error> {
    let table = reformat_cache(cache);
    serde_yaml::to_writer(out, &table)
        .map_err(|e| Error::Parse(format!("cannot encode cache as YAML: {}", e)))
}

pub fn load_json<R: Read>(rd: R, profile: CpuProfile) -> Result<MultCache, Error> {
    let table: CacheDump = serde_json::from_reader(rd)
        .map_err(|e| Error::Parse(format!("cannot decode cache JSON: {}", e)))?;
    load_table(table, profile)
}

pub fn load_yaml<R: Read>(rd: R, profile: CpuProfile) -> Result<MultCache, Error> {
    let table: CacheDump = serde_yaml::from_reader(rd)
        .map_err(|e| Error::Parse(format!("cannot decode cache YAML: {}", e)))?;
    load_table(table, profile)
}

/// Rebuild a cache from a parsed container and check its
/// consistency. Statistics start at zero; the lower bounds of
/// unfinished entries are not carried by the dump formats and reset
/// to zero.
pub fn load_table(table: CacheDump, profile: CpuProfile) -> Result<MultCache, Error> {
    let mut cache = MultCache::new(profile);
    for (n, record) in table.products {
        let instrs = parse_sequence(&record.sequence, &profile)?;
        let finished = record.search_status == SEARCH_COMPLETED;
        let lower = if finished { record.cost } else { 0.0 };
        cache.insert(n, lower, record.cost, finished, &instrs);
    }
    cache.check()?;
    Ok(cache)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::DEFAULT_PROFILE;
    use crate::mult::MultSearch;

    fn populated_cache() -> MultCache {
        let mut engine = MultSearch::new(DEFAULT_PROFILE);
        for n in [7, 12, 51, -7] {
            engine.find_sequence(n).unwrap();
        }
        engine.cache
    }

    fn assert_caches_match(original: &MultCache, loaded: &MultCache) {
        for (num, entry) in original.iter() {
            if entry.instrs.is_empty() || entry.upper.is_infinite() {
                // Unreached entries are not round-tripped.
                continue;
            }
            let got = loaded
                .get(*num)
                .unwrap_or_else(|| panic!("loaded cache missing {}", num));
            assert_eq!(got.upper, entry.upper, "upper bound for {}", num);
            assert_eq!(got.finished, entry.finished, "finished flag for {}", num);
            assert_eq!(got.instrs, entry.instrs, "sequence for {}", num);
            if got.finished {
                assert_eq!(got.lower, entry.lower, "lower bound for {}", num);
            }
        }
    }

    #[test]
    fn test_json_round_trip() {
        let cache = populated_cache();
        let mut buf = Vec::new();
        dump_json(&cache, &mut buf).unwrap();
        let loaded = load_json(buf.as_slice(), DEFAULT_PROFILE).unwrap();
        loaded.check().unwrap();
        assert_caches_match(&cache, &loaded);
    }

    #[test]
    fn test_yaml_round_trip() {
        let cache = populated_cache();
        let mut buf = Vec::new();
        dump_yaml(&cache, &mut buf).unwrap();
        let loaded = load_yaml(buf.as_slice(), DEFAULT_PROFILE).unwrap();
        loaded.check().unwrap();
        assert_caches_match(&cache, &loaded);
    }

    #[test]
    fn test_round_trip_through_file() {
        let cache = populated_cache();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let mut file = std::fs::File::create(&path).unwrap();
        dump_json(&cache, &mut file).unwrap();

        let file = std::fs::File::open(&path).unwrap();
        let loaded = load_json(file, DEFAULT_PROFILE).unwrap();
        assert_caches_match(&cache, &loaded);
    }

    #[test]
    fn test_container_fields() {
        let table = reformat_cache(&populated_cache());
        assert_eq!(table.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(table.costs.get("add"), Some(&1.0));
        assert_eq!(table.costs.get("nop"), Some(&0.0));

        let seven = &table.products[&7];
        assert_eq!(seven.cost, 2.0);
        assert_eq!(seven.search_status, SEARCH_COMPLETED);
        assert_eq!(seven.sequence, "[n<<3, n-1]");
    }

    #[test]
    fn test_infinite_costs_are_omitted() {
        let cache = MultCache::new(crate::cpu::CHAINED_ADDS);
        let table = reformat_cache(&cache);
        assert!(table.costs.contains_key("add"));
        assert!(!table.costs.contains_key("subtract"));
        assert!(!table.costs.contains_key("shift"));
        // The zero preload has an infinite cost under this profile
        // and must not reach the products.
        assert!(!table.products.contains_key(&0));
    }

    #[test]
    fn test_text_dump() {
        let mut cache = populated_cache();
        cache.lookup(7);
        let mut buf = Vec::new();
        dump(&cache, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("[n<<3, n-1]"), "dump was:\n{}", text);
        assert!(text.contains("Cache hits (finished):"));
        assert!(text.contains("Cache misses:"));
        // Unfinished entries print a half-open interval.
        assert!(text.contains("("), "expected an interval in:\n{}", text);
    }

    #[test]
    fn test_tsv_dump() {
        let cache = populated_cache();
        let mut buf = Vec::new();
        dump_tsv(&cache, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("n\tcost\tsearch-status\tsequence"));
        assert!(text.contains("7\t2\tcompleted\t[n<<3, n-1]"));
    }

    #[test]
    fn test_load_rejects_malformed_sequence() {
        let json = r#"{
            "version": "0.1.0",
            "costs": {"add": 1.0},
            "products": {"3": {"cost": 2.0, "search-status": "completed", "sequence": "[n*3]"}}
        }"#;
        assert!(matches!(
            load_json(json.as_bytes(), DEFAULT_PROFILE),
            Err(Error::Parse(_))
        ));
    }
}
