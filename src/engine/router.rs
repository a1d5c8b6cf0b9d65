#[cfg(feature = "serde")]
use serde::Serialize;

use super::graph::NodeId;

/*
Output Routing
==============

Routing maps a node's output streams onto the server's physical output
channels. Three addressing modes cover the source environment's `out(chnl,
inc)` forms:

  Offset { first, step }   stream i -> (first + i*step) % nchnls
                           `out(chnl=0, inc=2)` on 8 channels: 0, 2, 4, 6

  Explicit(list)           stream i -> list[i % len] % nchnls
                           `out(chnl=[3,4,2,5,1,6,0,7])`: exact ordering

  Scrambled { step }       the Offset assignment starting at 0, then a
                           uniform random permutation of it, drawn once per
                           route call (`out(chnl=-1)`)

Assignments are computed when the route is registered and stay fixed until
the node is routed again. Several routes may land on the same physical
channel; the server sums every contribution, it never overwrites. Indices
beyond the channel count wrap modulo, never error.
*/

/// Stream-to-physical-channel addressing for one routed node.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelMap {
    /// First stream to `first`, then stepping by `step` per stream.
    Offset { first: usize, step: usize },
    /// Stream `i` to `list[i % len]`, increment ignored.
    Explicit(Vec<usize>),
    /// The stepped assignment from channel 0, shuffled.
    Scrambled { step: usize },
}

impl Default for ChannelMap {
    fn default() -> Self {
        ChannelMap::Offset { first: 0, step: 1 }
    }
}

impl ChannelMap {
    /// Physical channel for each of `width` source streams.
    pub(crate) fn assign(
        &self,
        width: usize,
        channels: usize,
        rng: &mut fastrand::Rng,
    ) -> Vec<usize> {
        match self {
            ChannelMap::Offset { first, step } => {
                (0..width).map(|i| (first + i * step) % channels).collect()
            }
            ChannelMap::Explicit(list) => (0..width)
                .map(|i| {
                    if list.is_empty() {
                        0
                    } else {
                        list[i % list.len()] % channels
                    }
                })
                .collect(),
            ChannelMap::Scrambled { step } => {
                let mut assigned: Vec<usize> = (0..width).map(|i| (i * step) % channels).collect();
                rng.shuffle(&mut assigned);
                assigned
            }
        }
    }
}

/// One registered routing: a node and its per-stream channel assignment.
#[derive(Debug, Clone)]
pub(crate) struct Route {
    pub node: NodeId,
    pub channels: Vec<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_steps_through_channels() {
        let mut rng = fastrand::Rng::with_seed(0);
        let map = ChannelMap::Offset { first: 0, step: 2 };
        assert_eq!(map.assign(4, 8, &mut rng), vec![0, 2, 4, 6]);
    }

    #[test]
    fn offset_wraps_modulo_channel_count() {
        let mut rng = fastrand::Rng::with_seed(0);
        let map = ChannelMap::Offset { first: 1, step: 1 };
        assert_eq!(map.assign(4, 2, &mut rng), vec![1, 0, 1, 0]);
    }

    #[test]
    fn explicit_list_is_followed_exactly() {
        let mut rng = fastrand::Rng::with_seed(0);
        let map = ChannelMap::Explicit(vec![3, 4, 2, 5, 1, 6, 0, 7]);
        assert_eq!(map.assign(8, 8, &mut rng), vec![3, 4, 2, 5, 1, 6, 0, 7]);
    }

    #[test]
    fn explicit_list_wraps_and_sanitizes() {
        let mut rng = fastrand::Rng::with_seed(0);
        let map = ChannelMap::Explicit(vec![0, 9]);
        // list wraps over width, indices wrap modulo the channel count
        assert_eq!(map.assign(4, 8, &mut rng), vec![0, 1, 0, 1]);
    }

    #[test]
    fn scrambled_covers_every_channel_exactly_once() {
        let mut rng = fastrand::Rng::with_seed(7);
        let map = ChannelMap::Scrambled { step: 1 };
        for _ in 0..16 {
            let mut assigned = map.assign(8, 8, &mut rng);
            assigned.sort_unstable();
            assert_eq!(assigned, vec![0, 1, 2, 3, 4, 5, 6, 7]);
        }
    }

    #[test]
    fn scrambled_is_reproducible_from_the_seed() {
        let mut a = fastrand::Rng::with_seed(99);
        let mut b = fastrand::Rng::with_seed(99);
        let map = ChannelMap::Scrambled { step: 1 };
        assert_eq!(map.assign(8, 8, &mut a), map.assign(8, 8, &mut b));
    }
}
