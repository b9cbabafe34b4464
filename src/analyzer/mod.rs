// 분석 레이어 모듈
// 기술적 지표, 차트 패턴, 감성 점수를 각각 하나의 LeafOpinion으로 축약합니다.

pub mod pattern_analyzer;
pub mod sentiment_analyzer;
pub mod technical_analyzer;

pub use pattern_analyzer::{ChartPattern, PatternAnalyzer};
pub use sentiment_analyzer::{PolarityScorer, SentimentAnalyzer};
pub use technical_analyzer::{TechnicalAnalyzer, TechnicalScoring};

use crate::candle::Candle;
use crate::candle_store::CandleStore;
use crate::model::LeafOpinion;
use std::fmt::Debug;

/// 캔들 시계열을 보고 의견을 내는 분석기
///
/// 구현체는 상태가 없어야 하며, 데이터가 부족하거나 오염된 경우
/// 패닉 대신 `LeafOpinion::neutral()`을 돌려줘야 합니다.
pub trait CandleAnalyzer<C: Candle>: Send + Sync + Debug {
    /// 로그에 쓰이는 분석기 이름
    fn name(&self) -> &'static str;

    /// 저장소의 캔들로 의견 생성
    fn analyze(&self, storage: &CandleStore<C>) -> LeafOpinion;

    /// 의견과 함께 사람이 읽을 수 있는 근거 목록을 돌려줍니다.
    fn analyze_detailed(&self, storage: &CandleStore<C>) -> (LeafOpinion, Vec<String>) {
        (self.analyze(storage), Vec::new())
    }
}
