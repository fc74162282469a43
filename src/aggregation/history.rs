use std::iter::Peekable;

use crate::models::{FoodEntry, HistoryRecord, VitaminEntry, WeightEntry};

pub type RecordStream = Box<dyn Iterator<Item = HistoryRecord> + Send>;

/// Lazy k-way merge of streams that are each already ordered by timestamp.
///
/// Equal timestamps come out in stream order, then in arrival order within a
/// stream. Output order is unspecified if an input is not sorted.
pub struct MergeByTimestamp<I: Iterator<Item = HistoryRecord>> {
    streams: Vec<Peekable<I>>,
}

impl<I: Iterator<Item = HistoryRecord>> MergeByTimestamp<I> {
    pub fn new(streams: impl IntoIterator<Item = I>) -> Self {
        Self {
            streams: streams.into_iter().map(Iterator::peekable).collect(),
        }
    }
}

impl<I: Iterator<Item = HistoryRecord>> Iterator for MergeByTimestamp<I> {
    type Item = HistoryRecord;

    fn next(&mut self) -> Option<HistoryRecord> {
        let mut earliest = None;
        for (index, stream) in self.streams.iter_mut().enumerate() {
            if let Some(record) = stream.peek() {
                if earliest.map_or(true, |(_, at)| record.timestamp < at) {
                    earliest = Some((index, record.timestamp));
                }
            }
        }

        let (index, _) = earliest?;
        self.streams[index].next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.streams.iter().fold((0, Some(0)), |(low, high), stream| {
            let (l, h) = stream.size_hint();
            (
                low.saturating_add(l),
                high.zip(h).and_then(|(a, b)| a.checked_add(b)),
            )
        })
    }
}

/// The history view: food, weight and vitamin entries interleaved by time
pub type HistoryFeed = MergeByTimestamp<RecordStream>;

pub fn history_feed(
    food: Vec<FoodEntry>,
    weight: Vec<WeightEntry>,
    vitamin: Vec<VitaminEntry>,
) -> HistoryFeed {
    let streams: [RecordStream; 3] = [
        Box::new(food.into_iter().map(HistoryRecord::from)),
        Box::new(weight.into_iter().map(HistoryRecord::from)),
        Box::new(vitamin.into_iter().map(HistoryRecord::from)),
    ];
    MergeByTimestamp::new(streams)
}
