//! CSV 일봉 데이터 로더.
//!
//! # 파일 형식
//!
//! 종목/벤치마크 일봉 CSV (헤더 필수, 추가 컬럼은 무시):
//!
//! ```text
//! date,open,high,low,close,volume
//! 2024-01-02,71000,71500,70500,71200,12345678
//! ```
//!
//! 섹터 매핑 CSV:
//!
//! ```text
//! symbol,sector
//! 005930,반도체
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use screener_analytics::{SkipReason, SkippedSymbol};
use screener_core::{Candle, SymbolHistory};

/// 섹터 매핑 행.
#[derive(Debug, Deserialize)]
struct SectorRow {
    symbol: String,
    sector: String,
}

/// 일봉 CSV 파일을 읽어 날짜 오름차순 캔들 목록으로 반환합니다.
///
/// 정렬은 하지 않습니다. 순서 검증은 스크리너가 수행합니다.
pub fn load_candles(path: &Path) -> Result<Vec<Candle>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV: {}", path.display()))?;

    let mut candles = Vec::new();
    for (line, row) in reader.deserialize::<Candle>().enumerate() {
        // 헤더가 1행이므로 데이터는 2행부터
        let candle =
            row.with_context(|| format!("Invalid row {} in {}", line + 2, path.display()))?;
        candles.push(candle);
    }

    debug!(path = %path.display(), bars = candles.len(), "Loaded candles");
    Ok(candles)
}

/// 섹터 매핑 CSV를 읽습니다. 빈 섹터는 건너뜁니다.
pub fn load_sector_map(path: &Path) -> Result<HashMap<String, String>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open sector map: {}", path.display()))?;

    let mut sectors = HashMap::new();
    for row in reader.deserialize::<SectorRow>() {
        let row = row.with_context(|| format!("Invalid sector row in {}", path.display()))?;
        if row.sector.is_empty() {
            continue;
        }
        sectors.insert(row.symbol, row.sector);
    }

    info!(path = %path.display(), symbols = sectors.len(), "Loaded sector map");
    Ok(sectors)
}

/// 디렉토리 안의 `*.csv` 파일 목록 (파일명 순).
fn csv_files(dir: &Path, exclude: Option<&Path>) -> Result<Vec<PathBuf>> {
    let exclude = exclude.and_then(|p| p.canonicalize().ok());
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if !is_csv {
            continue;
        }
        if exclude.is_some() && path.canonicalize().ok() == exclude {
            continue;
        }
        files.push(path);
    }

    files.sort();
    Ok(files)
}

/// 디렉토리에서 읽은 종목 유니버스.
#[derive(Debug, Default)]
pub struct Universe {
    pub histories: Vec<SymbolHistory>,
    /// 읽지 못한 종목 파일 (배치 보고서의 제외 목록에 합쳐짐)
    pub unreadable: Vec<SkippedSymbol>,
}

impl Universe {
    /// 읽은 종목과 읽지 못한 종목을 합친 파일 수.
    pub fn file_count(&self) -> usize {
        self.histories.len() + self.unreadable.len()
    }
}

/// 종목 디렉토리에서 유니버스를 구성합니다.
///
/// 파일명(확장자 제외)이 심볼이 되며, 섹터는 `sectors`에서 찾습니다.
/// `exclude`는 같은 디렉토리에 벤치마크 파일이 있을 때 제외하기 위한 경로입니다.
/// 파싱할 수 없는 파일은 해당 종목만 `unreadable`로 빠지고 나머지는 계속 읽습니다.
pub fn load_universe(
    dir: &Path,
    sectors: &HashMap<String, String>,
    exclude: Option<&Path>,
) -> Result<Universe> {
    let mut universe = Universe::default();

    for path in csv_files(dir, exclude)? {
        let Some(symbol) = path.file_stem().and_then(|s| s.to_str()) else {
            warn!(path = %path.display(), "Skipping file with non UTF-8 name");
            continue;
        };
        match load_candles(&path) {
            Ok(candles) => {
                let sector = sectors.get(symbol).cloned();
                universe
                    .histories
                    .push(SymbolHistory::new(symbol, sector, candles));
            }
            Err(e) => {
                warn!(symbol, error = %format!("{:#}", e), "Skipping unreadable symbol file");
                universe.unreadable.push(SkippedSymbol {
                    symbol: symbol.to_string(),
                    reason: SkipReason::MalformedCandle,
                    message: format!("{:#}", e),
                });
            }
        }
    }

    let unmapped = universe
        .histories
        .iter()
        .filter(|h| h.sector.is_none())
        .count();
    if !sectors.is_empty() && unmapped > 0 {
        warn!(unmapped, "Symbols without sector mapping");
    }

    info!(
        dir = %dir.display(),
        symbols = universe.histories.len(),
        unreadable = universe.unreadable.len(),
        "Loaded universe"
    );
    Ok(universe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::fs;
    use tempfile::tempdir;

    const HEADER: &str = "date,open,high,low,close,volume\n";

    #[test]
    fn test_load_candles() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("005930.csv");
        fs::write(
            &path,
            format!(
                "{}2024-01-02,100,105,99,104,1000\n2024-01-03, 104 ,106,103,105.5,1200\n",
                HEADER
            ),
        )
        .unwrap();

        let candles = load_candles(&path).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[1].open, dec!(104));
        assert_eq!(candles[1].close, dec!(105.5));
        assert_eq!(candles[1].date.to_string(), "2024-01-03");
    }

    #[test]
    fn test_load_candles_reports_bad_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("BAD.csv");
        fs::write(&path, format!("{}2024-01-02,100,105,99,abc,1000\n", HEADER)).unwrap();

        let err = load_candles(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid row 2"));
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("X.csv");
        fs::write(
            &path,
            "date,open,high,low,close,volume,adj_close\n2024-01-02,1,2,1,2,10,2\n",
        )
        .unwrap();

        assert_eq!(load_candles(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_load_universe_with_sectors() {
        let dir = tempdir().unwrap();
        let row = format!("{}2024-01-02,10,11,9,10,100\n", HEADER);
        fs::write(dir.path().join("BBB.csv"), &row).unwrap();
        fs::write(dir.path().join("AAA.csv"), &row).unwrap();
        fs::write(dir.path().join("KOSPI.csv"), &row).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let sector_path = dir.path().join("sectors.map");
        fs::write(&sector_path, "symbol,sector\nAAA,반도체\nBBB,\n").unwrap();
        let sectors = load_sector_map(&sector_path).unwrap();
        assert_eq!(sectors.len(), 1);

        let benchmark = dir.path().join("KOSPI.csv");
        let universe = load_universe(dir.path(), &sectors, Some(&benchmark)).unwrap();

        let symbols: Vec<&str> = universe
            .histories
            .iter()
            .map(|h| h.symbol.as_str())
            .collect();
        assert_eq!(symbols, vec!["AAA", "BBB"]);
        assert_eq!(universe.histories[0].sector.as_deref(), Some("반도체"));
        assert_eq!(universe.histories[1].sector, None);
        assert!(universe.unreadable.is_empty());
    }

    #[test]
    fn test_unreadable_file_skips_only_that_symbol() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("GOOD.csv"),
            format!("{}2024-01-02,10,11,9,10,100
", HEADER),
        )
        .unwrap();
        fs::write(
            dir.path().join("BAD.csv"),
            format!("{}2024-01-02,10,11,9,oops,100
", HEADER),
        )
        .unwrap();

        let universe = load_universe(dir.path(), &HashMap::new(), None).unwrap();

        assert_eq!(universe.file_count(), 2);
        assert_eq!(universe.histories.len(), 1);
        assert_eq!(universe.histories[0].symbol, "GOOD");
        assert_eq!(universe.unreadable.len(), 1);
        assert_eq!(universe.unreadable[0].symbol, "BAD");
        assert_eq!(universe.unreadable[0].reason, SkipReason::MalformedCandle);
        assert!(universe.unreadable[0].message.contains("Invalid row 2"));
    }
}
