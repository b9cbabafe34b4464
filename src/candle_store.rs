use crate::candle::Candle;

/// 제한된 크기의 캔들 저장소
///
/// 지정된 최대 크기를 유지하며 캔들을 저장하는 구조체입니다.
/// 최대 크기를 초과하면 가장 오래된 캔들이 자동으로 제거됩니다.
/// 캔들은 datetime 기준으로 내림차순 정렬되어 저장됩니다 (최신 캔들이 먼저 옴).
#[derive(Debug, Clone)]
pub struct CandleStore<T: Candle> {
    items: Vec<T>,
    pub max_size: usize,
    pub use_duplicated_filter: bool,
}

impl<T> CandleStore<T>
where
    T: Candle,
{
    /// 새로운 CandleStore 인스턴스를 생성합니다.
    ///
    /// # Arguments
    /// * `items` - 초기 캔들 목록 (순서 무관)
    /// * `max_size` - 저장소의 최대 크기
    /// * `use_duplicated_filter` - 중복 캔들 필터링 사용 여부
    pub fn new(mut items: Vec<T>, max_size: usize, use_duplicated_filter: bool) -> CandleStore<T> {
        // 최신 데이터가 먼저 오도록 정렬
        items.sort_by(|a, b| b.datetime().cmp(&a.datetime()));

        if use_duplicated_filter {
            items.dedup_by(|a, b| a.datetime() == b.datetime());
        }

        if items.len() > max_size {
            items.truncate(max_size);
        }

        CandleStore {
            items,
            max_size,
            use_duplicated_filter,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 가장 최신 캔들
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    /// 지정된 인덱스의 캔들 (0이 최신)
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// 최신순 캔들 슬라이스
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// 최신 종가
    pub fn last_close(&self) -> Option<f64> {
        self.first().map(|candle| candle.close_price())
    }

    /// 모든 캔들의 가격이 유한한 값인지 확인합니다.
    pub fn is_well_formed(&self) -> bool {
        self.items.iter().all(|candle| candle.is_finite())
    }

    /// 저장된 캔들을 시간 순서대로(오래된 것부터) 정렬하여 반환합니다.
    pub fn get_time_ordered_items(&self) -> Vec<T> {
        let mut items = self.items.clone();
        items.reverse();
        items
    }

    /// 시간 순서대로 정렬된 종가 목록
    pub fn time_ordered_closes(&self) -> Vec<f64> {
        self.items
            .iter()
            .rev()
            .map(|candle| candle.close_price())
            .collect()
    }
}
