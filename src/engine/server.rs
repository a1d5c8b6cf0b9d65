use crate::graph::mix::Mixer;
use crate::graph::node::{BlockCtx, SignalNode};
use crate::param::{ControlSpec, Param};
use crate::stream::Stream;
use crate::MAX_BLOCK_SIZE;

use super::error::{ConfigError, GraphError};
use super::graph::{Graph, NodeId};
use super::router::{ChannelMap, Route};
use super::snapshot::{Monitor, Publisher};

/*
Server
======

The server owns the sample clock, the node graph, the routing table, and
the physical output bank. One call to `tick()` is one block:

  1. run every node in dependency order (control generators update
     themselves from the sample clock as they go)
  2. sum each routed node's streams into its assigned physical channels
  3. publish snapshots for display consumers
  4. advance the clock by one block

Parameter reassignments and graph membership changes go through `&mut self`
methods, so they land strictly between blocks; the tick itself never
allocates on the steady-state path, never locks, and never fails.

`start()` and `stop()` gate processing without touching node state: a
stopped server ticks silence and holds the clock, so restarting resumes
phase-continuous output.

The device boundary stays external. A playback callback either reads the
channel-separated bank returned by `tick()` or lets `render_interleaved`
drive ticks and interleave into whatever buffer size the device asks for.
*/

/// Validated once at construction; invalid values never reach a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub sample_rate: f32,
    pub block_size: usize,
    /// Number of physical output channels.
    pub channels: usize,
    /// Seed for the single process-wide random source. Two servers with the
    /// same seed and the same patch produce identical output.
    pub seed: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100.0,
            block_size: 256,
            channels: 2,
            seed: 0,
        }
    }
}

pub struct Server {
    sample_rate: f32,
    block_size: usize,
    channels: usize,
    graph: Graph,
    routes: Vec<Route>,
    physical: Vec<Stream>,
    clock: u64,
    running: bool,
    rng: fastrand::Rng,
    bus_publisher: Publisher,
    node_publishers: Vec<(NodeId, Publisher)>,
    #[cfg(feature = "rtrb")]
    scopes: Vec<super::snapshot::ScopeFeed>,
    carry: Vec<f32>,
    carry_pos: usize,
}

impl Server {
    pub fn new(config: ServerConfig) -> Result<Self, ConfigError> {
        if !(config.sample_rate.is_finite() && config.sample_rate > 0.0) {
            return Err(ConfigError::SampleRate(config.sample_rate));
        }
        if config.block_size == 0 || config.block_size > MAX_BLOCK_SIZE {
            return Err(ConfigError::BlockSize(config.block_size));
        }
        if config.channels == 0 {
            return Err(ConfigError::Channels(config.channels));
        }

        let carry_len = config.channels * config.block_size;
        Ok(Self {
            sample_rate: config.sample_rate,
            block_size: config.block_size,
            channels: config.channels,
            graph: Graph::new(config.block_size, config.sample_rate),
            routes: Vec::new(),
            physical: (0..config.channels)
                .map(|_| Stream::new(config.block_size))
                .collect(),
            clock: 0,
            running: false,
            rng: fastrand::Rng::with_seed(config.seed),
            bus_publisher: Publisher::new(),
            node_publishers: Vec::new(),
            #[cfg(feature = "rtrb")]
            scopes: Vec::new(),
            carry: vec![0.0; carry_len],
            carry_pos: carry_len,
        })
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Absolute sample index of the next block's first frame.
    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    /// Halt processing without releasing any node state.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Reseed the random source (control generators, noise, scrambled
    /// routing). Takes effect on the next draw.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = fastrand::Rng::with_seed(seed);
    }

    /// Register a node; its expansion width is resolved here and fixed for
    /// the node's lifetime.
    pub fn add(&mut self, node: impl SignalNode + 'static) -> Result<NodeId, GraphError> {
        self.graph.add(node)
    }

    /// Remove a node along with its routes and monitors. Fails while
    /// another node still reads from it.
    pub fn remove(&mut self, id: NodeId) -> Result<(), GraphError> {
        self.graph.remove(id)?;
        self.routes.retain(|r| r.node != id);
        self.node_publishers.retain(|(n, _)| *n != id);
        #[cfg(feature = "rtrb")]
        self.scopes.retain(|s| s.node != id);
        Ok(())
    }

    /// Reassign a node parameter between blocks.
    pub fn set_param(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<Param>,
    ) -> Result<(), GraphError> {
        self.graph.set_param(id, name, value.into())
    }

    /// Fold a node's streams down to exactly `voices` streams by modulo
    /// summation, returning the new mixer node.
    pub fn mix(&mut self, source: NodeId, voices: usize) -> Result<NodeId, GraphError> {
        self.graph.add(Mixer::new(source, voices))
    }

    /// Route a node to the physical outputs starting at channel 0.
    pub fn out(&mut self, node: NodeId) -> Result<(), GraphError> {
        self.route(node, ChannelMap::default())
    }

    /// Route a node with explicit addressing. The assignment is computed
    /// now (scrambled maps draw their permutation here) and stays fixed
    /// until the node is routed again.
    pub fn route(&mut self, node: NodeId, map: ChannelMap) -> Result<(), GraphError> {
        let width = self
            .graph
            .width(node)
            .ok_or(GraphError::UnknownNode(node))?;
        let channels = map.assign(width, self.channels, &mut self.rng);
        self.routes.push(Route { node, channels });
        Ok(())
    }

    /// Drop every route of a node. The node keeps computing; it just no
    /// longer reaches the physical outputs.
    pub fn unroute(&mut self, node: NodeId) {
        self.routes.retain(|r| r.node != node);
    }

    /// Channel assignment of each active route for a node, in registration
    /// order.
    pub fn routing_of(&self, node: NodeId) -> Vec<&[usize]> {
        self.routes
            .iter()
            .filter(|r| r.node == node)
            .map(|r| r.channels.as_slice())
            .collect()
    }

    pub fn width(&self, node: NodeId) -> Option<usize> {
        self.graph.width(node)
    }

    /// Read-only view of a node's last computed block (same-thread use;
    /// displays on other threads go through [`Server::monitor`]).
    pub fn bank(&self, node: NodeId) -> Option<&[Stream]> {
        self.graph.bank(node)
    }

    pub fn controls(&self, node: NodeId) -> Vec<ControlSpec> {
        self.graph.controls(node)
    }

    /// Snapshot handle for the physical output bus.
    pub fn monitor_output(&self) -> Monitor {
        self.bus_publisher.monitor()
    }

    /// Snapshot handle for one node's streams, published after every block.
    pub fn monitor(&mut self, node: NodeId) -> Result<Monitor, GraphError> {
        if self.graph.width(node).is_none() {
            return Err(GraphError::UnknownNode(node));
        }
        let publisher = Publisher::new();
        let monitor = publisher.monitor();
        self.node_publishers.push((node, publisher));
        Ok(monitor)
    }

    /// Ring-buffer tap on one stream of a node, for sample-continuous
    /// consumers. The audio path drops samples when the consumer lags.
    #[cfg(feature = "rtrb")]
    pub fn scope(
        &mut self,
        node: NodeId,
        stream: usize,
        capacity: usize,
    ) -> Result<rtrb::Consumer<f32>, GraphError> {
        let width = self
            .graph
            .width(node)
            .ok_or(GraphError::UnknownNode(node))?;
        let (feed, consumer) =
            super::snapshot::ScopeFeed::new(node, stream % width, capacity.max(1));
        self.scopes.push(feed);
        Ok(consumer)
    }

    /// Compute one block and return the physical output bank, one stream
    /// per channel. While stopped, returns silence and holds the clock.
    pub fn tick(&mut self) -> &[Stream] {
        for channel in &mut self.physical {
            channel.clear();
        }
        if !self.running {
            return &self.physical;
        }

        let mut ctx = BlockCtx {
            sample_rate: self.sample_rate,
            block_size: self.block_size,
            start: self.clock,
            rng: &mut self.rng,
        };
        self.graph.process_block(&mut ctx);

        for route in &self.routes {
            let bank = match self.graph.bank(route.node) {
                Some(bank) => bank,
                None => continue,
            };
            for (stream, &channel) in bank.iter().zip(&route.channels) {
                self.physical[channel].accumulate(stream.samples());
            }
        }

        // Snapshot capture copies the block, so it only runs for publishers
        // somebody still holds a monitor on; an unobserved tick stays off
        // the allocator.
        if self.bus_publisher.has_readers() {
            self.bus_publisher.publish(self.clock, &self.physical);
        }
        for (node, publisher) in &self.node_publishers {
            if !publisher.has_readers() {
                continue;
            }
            if let Some(bank) = self.graph.bank(*node) {
                publisher.publish(self.clock, bank);
            }
        }
        #[cfg(feature = "rtrb")]
        for feed in &mut self.scopes {
            if let Some(bank) = self.graph.bank(feed.node) {
                feed.push_block(bank[feed.stream].samples());
            }
        }

        self.clock += self.block_size as u64;
        &self.physical
    }

    /// Device-callback contract: fill an interleaved buffer of any length,
    /// ticking as many blocks as needed and carrying the remainder into the
    /// next call. The buffer is expected to be interleaved across
    /// [`Server::channels`] channels.
    pub fn render_interleaved(&mut self, out: &mut [f32]) {
        let mut filled = 0;
        while filled < out.len() {
            if self.carry_pos >= self.carry.len() {
                self.tick();
                crate::io::interleave(&self.physical, &mut self.carry);
                self.carry_pos = 0;
            }
            let take = (out.len() - filled).min(self.carry.len() - self.carry_pos);
            out[filled..filled + take]
                .copy_from_slice(&self.carry[self.carry_pos..self.carry_pos + take]);
            self.carry_pos += take;
            filled += take;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::math::Sig;

    fn server() -> Server {
        let mut s = Server::new(ServerConfig {
            sample_rate: 48_000.0,
            block_size: 64,
            channels: 2,
            seed: 1,
        })
        .unwrap();
        s.start();
        s
    }

    #[test]
    fn invalid_configs_fail_before_any_block() {
        let bad_rate = ServerConfig {
            sample_rate: 0.0,
            ..ServerConfig::default()
        };
        assert!(matches!(
            Server::new(bad_rate),
            Err(ConfigError::SampleRate(_))
        ));

        let bad_block = ServerConfig {
            block_size: 0,
            ..ServerConfig::default()
        };
        assert!(matches!(
            Server::new(bad_block),
            Err(ConfigError::BlockSize(0))
        ));

        let bad_channels = ServerConfig {
            channels: 0,
            ..ServerConfig::default()
        };
        assert!(matches!(
            Server::new(bad_channels),
            Err(ConfigError::Channels(0))
        ));
    }

    #[test]
    fn stopped_server_ticks_silence_and_holds_the_clock() {
        let mut s = server();
        s.stop();
        let out = s.tick();
        assert!(out[0].samples().iter().all(|&x| x == 0.0));
        assert_eq!(s.clock(), 0);

        s.start();
        s.tick();
        assert_eq!(s.clock(), 64);
    }

    #[test]
    fn contributions_to_a_shared_channel_are_summed() {
        let mut s = server();
        let a = s.add(Sig::new(0.25)).unwrap();
        let b = s.add(Sig::new(0.5)).unwrap();
        s.out(a).unwrap();
        s.out(b).unwrap();

        let out = s.tick();
        assert!(out[0].samples().iter().all(|&x| (x - 0.75).abs() < 1e-6));
        assert!(out[1].samples().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn unroute_silences_without_removing_the_node() {
        let mut s = server();
        let a = s.add(Sig::new(1.0)).unwrap();
        s.out(a).unwrap();
        s.tick();
        s.unroute(a);
        let out = s.tick();
        assert!(out[0].samples().iter().all(|&x| x == 0.0));
        assert_eq!(s.width(a), Some(1));
    }

    #[test]
    fn render_interleaved_carries_partial_blocks() {
        let mut s = server();
        let a = s.add(Sig::new(vec![0.25, 0.5])).unwrap();
        s.out(a).unwrap();

        // 3 frames * 2 channels, not a multiple of the block size
        let mut buf = [0.0f32; 6];
        s.render_interleaved(&mut buf);
        assert_eq!(buf, [0.25, 0.5, 0.25, 0.5, 0.25, 0.5]);

        // The next call picks up inside the same block.
        let mut rest = vec![0.0f32; 2 * 64 - 6 + 4];
        s.render_interleaved(&mut rest);
        assert_eq!(s.clock(), 128);
    }

    #[test]
    fn unobserved_ticks_publish_nothing() {
        let mut s = server();
        let a = s.add(Sig::new(0.5)).unwrap();
        s.out(a).unwrap();
        s.tick();

        // Blocks computed before anyone was watching are not captured; the
        // first monitored tick is.
        let bus = s.monitor_output();
        assert!(bus.latest().streams.is_empty());
        s.tick();
        assert_eq!(bus.latest().streams.len(), 2);
        assert_eq!(bus.latest().start, 64);

        // Dropping the last monitor stops capture again: the next tick
        // leaves the shared snapshot at the last observed block.
        drop(bus);
        s.tick();
        let again = s.monitor_output();
        assert_eq!(again.latest().start, 64);
    }

    #[test]
    fn monitor_publishes_after_each_block() {
        let mut s = server();
        let a = s.add(Sig::new(0.5)).unwrap();
        let monitor = s.monitor(a).unwrap();
        s.tick();
        let snap = monitor.latest();
        assert_eq!(snap.streams.len(), 1);
        assert!(snap.streams[0].iter().all(|&x| (x - 0.5).abs() < 1e-6));
    }
}
