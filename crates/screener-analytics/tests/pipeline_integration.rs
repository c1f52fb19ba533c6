//! 배치 스크리닝 통합 테스트
//!
//! 합성 유니버스로 지표 계산부터 섹터 순위, 6단계 평가까지 검증

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use screener_analytics::{
    BatchRequest, BatchRunner, Phase, PhaseStatus, SkipReason,
};
use screener_core::{AppConfig, Candle, MarketRegime, Signal, SymbolHistory};
use tokio_util::sync::CancellationToken;

/// 일봉 생성 (고가/저가는 종가 ±1.5%)
fn daily(n: usize, volume: Decimal, price_at: impl Fn(usize) -> Decimal) -> Vec<Candle> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    (0..n)
        .map(|i| {
            let close = price_at(i);
            let prev = if i == 0 { close } else { price_at(i - 1) };
            Candle::new(
                start + Duration::days(i as i64),
                prev,
                close.max(prev) * dec!(1.015),
                close.min(prev) * dec!(0.985),
                close,
                volume,
            )
        })
        .collect()
}

/// 완만한 상승 + 주기적 눌림
fn pullback_uptrend(i: usize) -> Decimal {
    let base = dec!(50) + Decimal::from(i) * dec!(0.15);
    let wave = Decimal::from((i % 10) as i64 - 5).abs() * dec!(0.2);
    base - wave
}

fn universe() -> Vec<SymbolHistory> {
    let sectors = [
        ("반도체", dec!(0.30)),
        ("2차전지", dec!(0.20)),
        ("자동차", dec!(0.10)),
        ("은행", dec!(0.00)),
        ("건설", dec!(-0.05)),
        ("유통", dec!(-0.10)),
        ("통신", dec!(-0.15)),
        ("유틸리티", dec!(-0.20)),
    ];

    let mut out = Vec::new();
    for (s, (sector, slope)) in sectors.iter().enumerate() {
        for k in 0..3 {
            let symbol = format!("{:02}{:02}", s, k);
            let offset = Decimal::from(k) * dec!(5);
            let slope = *slope;
            out.push(SymbolHistory::new(
                symbol,
                Some(sector.to_string()),
                daily(260, dec!(200000), move |i| {
                    dec!(100) + offset + Decimal::from(i) * slope
                }),
            ));
        }
    }
    out.push(SymbolHistory::new(
        "PULLBACK",
        Some("반도체".to_string()),
        daily(260, dec!(300000), pullback_uptrend),
    ));
    out.push(SymbolHistory::new("NEWLIST", None, daily(15, dec!(1000), |_| dec!(10))));
    out
}

fn benchmark() -> Vec<Candle> {
    daily(260, dec!(1000000), |i| dec!(2000) + Decimal::from(i) * dec!(2))
}

#[test]
fn test_full_batch() {
    let runner = BatchRunner::new(AppConfig::default()).unwrap();
    let universe = universe();
    let benchmark = benchmark();

    let report = runner
        .run(BatchRequest::new(&universe, &benchmark), &CancellationToken::new())
        .unwrap();

    assert_eq!(report.regime.regime, MarketRegime::Bull);
    assert_eq!(report.results.len(), universe.len() - 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].reason, SkipReason::InsufficientHistory);

    // 정렬: 점수 내림차순, 동점은 심볼 오름차순
    for pair in report.results.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(
            a.overall_score > b.overall_score
                || (a.overall_score == b.overall_score && a.symbol < b.symbol)
        );
    }

    // 섹터 순위
    let rankings = &report.sector_rankings;
    assert_eq!(rankings.total_sectors, 8);
    assert_eq!(rankings.top_sectors.len(), 3);
    assert!(rankings.top_sectors.is_disjoint(&rankings.bottom_sectors));
    assert!(rankings.top_sectors.contains("반도체"));
    assert!(rankings.bottom_sectors.contains("유틸리티"));

    // 하락 섹터 종목은 추세 단계에서 탈락
    let down = report.results.iter().find(|r| r.symbol == "0700").unwrap();
    assert_eq!(down.sector_context.score_impact, -5);
    assert_eq!(down.details.trend.status, PhaseStatus::Failed);
    assert_eq!(down.details.momentum.status, PhaseStatus::NotEvaluated);
    assert!(down.signal <= Signal::Neutral);

    // 근거 문장의 첫 줄은 섹터, 마지막 줄은 진입/손절/목표가
    let top = report.results.iter().find(|r| r.symbol == "0000").unwrap();
    assert!(top.rationale.first().unwrap().starts_with("주도 섹터"));
    assert!(top.rationale.last().unwrap().starts_with("진입"));
    assert!(top.details.liquidity.status.is_passed());

    // 집계
    assert_eq!(report.signal_counts.total(), report.results.len());
    assert_eq!(report.funnel.evaluated[Phase::Liquidity], report.results.len());
    assert!(report.funnel.passed[Phase::Trend] <= report.funnel.evaluated[Phase::Trend]);
}

#[test]
fn test_batch_is_deterministic() {
    let runner = BatchRunner::new(AppConfig::default()).unwrap();
    let universe = universe();
    let benchmark = benchmark();
    let request = BatchRequest::new(&universe, &benchmark).with_volatility_index(dec!(18.5));

    let a = runner.run(request, &CancellationToken::new()).unwrap();
    let b = runner.run(request, &CancellationToken::new()).unwrap();

    assert_eq!(a, b);
    assert!(a.regime.description.contains("18.50"));
}

#[test]
fn test_cancel_mid_run_keeps_partial_results() {
    let mut config = AppConfig::default();
    config.pipeline.worker_threads = Some(1);
    let runner = BatchRunner::new(config).unwrap();
    let universe = universe();
    let benchmark = benchmark();
    let token = CancellationToken::new();

    let report = runner
        .run_with_progress(BatchRequest::new(&universe, &benchmark), &token, || token.cancel())
        .unwrap();

    assert!(report.cancelled);
    assert!(!report.results.is_empty());
    assert!(report.results.len() < universe.len() - 1);
    assert!(report
        .skipped
        .iter()
        .any(|s| s.reason == SkipReason::Cancelled));
    // 처리된 결과는 정상 결과와 같은 형태
    for result in &report.results {
        assert!((0..=100).contains(&result.overall_score));
        assert!(!result.rationale.is_empty());
    }
}

#[test]
fn test_flat_market_avoids_entries() {
    let flat = |n| daily_flat(n, dec!(100), dec!(100000));
    let universe: Vec<SymbolHistory> = ["FLAT1", "FLAT2"]
        .iter()
        .map(|s| SymbolHistory::new(*s, None, flat(300)))
        .collect();
    let benchmark = flat(300);

    let runner = BatchRunner::new(AppConfig::default()).unwrap();
    let report = runner
        .run(BatchRequest::new(&universe, &benchmark), &CancellationToken::new())
        .unwrap();

    // ADX 0 → 횡보장
    assert_eq!(report.regime.regime, MarketRegime::Sideways);
    assert!(report.warnings.is_empty());
    assert_eq!(report.sector_rankings.total_sectors, 0);

    for result in &report.results {
        assert!(result.details.liquidity.status.is_passed());
        assert_eq!(result.details.trend.status, PhaseStatus::Failed);
        assert_eq!(result.details.trend.adx, Decimal::ZERO);
        assert!(result.signal <= Signal::Neutral);
        assert_eq!(result.sector_context.score_impact, 0);
    }
    assert_eq!(report.signal_counts[Signal::Buy] + report.signal_counts[Signal::StrongBuy], 0);
}

/// 시가=고가=저가=종가 일봉
fn daily_flat(n: usize, price: Decimal, volume: Decimal) -> Vec<Candle> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    (0..n)
        .map(|i| Candle::new(start + Duration::days(i as i64), price, price, price, price, volume))
        .collect()
}
