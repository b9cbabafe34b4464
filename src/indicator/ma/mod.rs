pub mod ema;

use std::fmt::Debug;
use std::fmt::Display;

/// 이동평균(Moving Average) 인터페이스
pub trait MA: Display + Send + Sync + Debug {
    /// 이동평균 계산 기간
    fn period(&self) -> usize;

    /// 현재 이동평균 값
    fn get(&self) -> f64;
}
