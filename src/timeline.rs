//! Merging of per-track event sequences into one global timeline.

use crate::event::Event;

/// Interleaves tracks by tick. Events sharing a tick are ordered by track index, and each track's
/// own order is preserved.
///
/// Every track must already be sorted by tick, which decoding guarantees. Events are retagged with
/// the index of the track they came from.
pub fn merge(tracks: Vec<Vec<Event>>) -> Vec<Event> {
    let mut timeline = Vec::with_capacity(tracks.iter().fold(0, |acc, track| acc + track.len()));

    struct TrackMerge {
        events: std::vec::IntoIter<Event>,
        next: Event,
        index: usize,
    }

    let mut merge_tracks = tracks
        .into_iter()
        .enumerate()
        .filter_map(|(index, track)| {
            let mut events = track.into_iter();
            events.next().map(|next| TrackMerge {
                events,
                next,
                index,
            })
        })
        .collect::<Vec<_>>();

    // `min_by_key` returns the first of several equal minimums, and `merge_tracks` stays sorted by
    // track index, so ties go to the lower track.
    while let Some((merge_i, merge)) = merge_tracks
        .iter_mut()
        .enumerate()
        .min_by_key(|(_, merge)| merge.next.tick)
    {
        timeline.push(Event {
            track: merge.index,
            ..merge.next
        });
        match merge.events.next() {
            Some(next) => merge.next = next,
            None => {
                merge_tracks.remove(merge_i);
            }
        }
    }
    timeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;

    fn track(ticks: &[u64], status: u8) -> Vec<Event> {
        ticks
            .iter()
            .map(|&tick| Event {
                tick,
                track: 0,
                kind: EventKind::Other { status },
            })
            .collect()
    }

    fn order(timeline: &[Event]) -> Vec<(u64, usize)> {
        timeline.iter().map(|ev| (ev.tick, ev.track)).collect()
    }

    #[test]
    fn interleaves_by_tick_then_track() {
        let timeline = merge(vec![track(&[0, 240], 0xA0), track(&[0, 480], 0xB0)]);
        assert_eq!(order(&timeline), vec![(0, 0), (0, 1), (240, 0), (480, 1)]);
    }

    #[test]
    fn keeps_track_order_within_a_tick() {
        let mut a = track(&[10, 10, 10], 0xA0);
        a[1].kind = EventKind::EndOfTrack;
        let b = track(&[0, 10], 0xB0);
        let timeline = merge(vec![a.clone(), b]);
        assert_eq!(
            order(&timeline),
            vec![(0, 1), (10, 0), (10, 0), (10, 0), (10, 1)]
        );
        let kinds = |events: &[Event]| events.iter().map(|ev| ev.kind).collect::<Vec<_>>();
        assert_eq!(kinds(&timeline[1..4]), kinds(&a));
    }

    #[test]
    fn empty_tracks_keep_their_index() {
        let timeline = merge(vec![vec![], track(&[5], 0xC0), vec![], track(&[5], 0xD0)]);
        assert_eq!(order(&timeline), vec![(5, 1), (5, 3)]);
    }

    #[test]
    fn merging_nothing_is_empty() {
        assert!(merge(vec![]).is_empty());
    }
}
