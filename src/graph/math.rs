use crate::graph::node::{shape, BlockCtx, Inputs, NoSuchParam, SignalNode};
use crate::param::Param;
use crate::stream::Stream;

/*
Signal Math Nodes
=================

The source environment lets patches write `a * c * 0.3` or `c ** 10` and
quietly wraps each operation in a little audio object. Here those wrappers
are explicit, first-class nodes, subject to the same expansion and
dependency rules as everything else:

  a * c * 0.3   ->  Product::new(a, c).with_mul(0.3)
  c ** 10       ->  Power::new(c, 10.0)
  h1 + h2 + h3  ->  Sum::new(vec![h1.into(), h2.into(), h3.into()])

`Sig` turns a plain value (or list) into streams, which is the usual way to
feed a constant into a node input or to build fixtures in tests. All four
carry the universal `mul`/`add` pair.
*/

/// A constant value as a signal. A sequence value expands into one stream
/// per entry.
pub struct Sig {
    value: Param,
    mul: Param,
    add: Param,
}

impl Sig {
    pub fn new(value: impl Into<Param>) -> Self {
        Self {
            value: value.into(),
            mul: Param::Constant(1.0),
            add: Param::Constant(0.0),
        }
    }

    pub fn with_mul(mut self, mul: impl Into<Param>) -> Self {
        self.mul = mul.into();
        self
    }

    pub fn with_add(mut self, add: impl Into<Param>) -> Self {
        self.add = add.into();
        self
    }
}

impl SignalNode for Sig {
    fn params(&self) -> Vec<&Param> {
        vec![&self.value, &self.mul, &self.add]
    }

    fn process_block(&mut self, inputs: &Inputs, out: &mut [Stream], _ctx: &mut BlockCtx) {
        for (i, stream) in out.iter_mut().enumerate() {
            let buf = stream.samples_mut();
            for n in 0..buf.len() {
                buf[n] = shape(
                    self.value.at(inputs, i, n),
                    self.mul.at(inputs, i, n),
                    self.add.at(inputs, i, n),
                );
            }
        }
    }

    fn set_param(&mut self, name: &str, value: Param) -> Result<(), NoSuchParam> {
        match name {
            "value" => self.value = value,
            "mul" => self.mul = value,
            "add" => self.add = value,
            _ => return Err(NoSuchParam),
        }
        Ok(())
    }
}

/// Elementwise product of two signals (ring modulation when both are
/// audio-rate).
pub struct Product {
    a: Param,
    b: Param,
    mul: Param,
    add: Param,
}

impl Product {
    pub fn new(a: impl Into<Param>, b: impl Into<Param>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            mul: Param::Constant(1.0),
            add: Param::Constant(0.0),
        }
    }

    pub fn with_mul(mut self, mul: impl Into<Param>) -> Self {
        self.mul = mul.into();
        self
    }

    pub fn with_add(mut self, add: impl Into<Param>) -> Self {
        self.add = add.into();
        self
    }
}

impl SignalNode for Product {
    fn params(&self) -> Vec<&Param> {
        vec![&self.a, &self.b, &self.mul, &self.add]
    }

    fn process_block(&mut self, inputs: &Inputs, out: &mut [Stream], _ctx: &mut BlockCtx) {
        for (i, stream) in out.iter_mut().enumerate() {
            let buf = stream.samples_mut();
            for n in 0..buf.len() {
                let product = self.a.at(inputs, i, n) * self.b.at(inputs, i, n);
                buf[n] = shape(product, self.mul.at(inputs, i, n), self.add.at(inputs, i, n));
            }
        }
    }

    fn set_param(&mut self, name: &str, value: Param) -> Result<(), NoSuchParam> {
        match name {
            "a" => self.a = value,
            "b" => self.b = value,
            "mul" => self.mul = value,
            "add" => self.add = value,
            _ => return Err(NoSuchParam),
        }
        Ok(())
    }
}

/// `base` raised to `exponent`, elementwise. `Power::new(c, 10.0)` rectifies
/// and narrows a bipolar signal the way `c ** 10` does in the source
/// environment.
pub struct Power {
    base: Param,
    exponent: Param,
    mul: Param,
    add: Param,
}

impl Power {
    pub fn new(base: impl Into<Param>, exponent: impl Into<Param>) -> Self {
        Self {
            base: base.into(),
            exponent: exponent.into(),
            mul: Param::Constant(1.0),
            add: Param::Constant(0.0),
        }
    }

    pub fn with_mul(mut self, mul: impl Into<Param>) -> Self {
        self.mul = mul.into();
        self
    }

    pub fn with_add(mut self, add: impl Into<Param>) -> Self {
        self.add = add.into();
        self
    }
}

impl SignalNode for Power {
    fn params(&self) -> Vec<&Param> {
        vec![&self.base, &self.exponent, &self.mul, &self.add]
    }

    fn process_block(&mut self, inputs: &Inputs, out: &mut [Stream], _ctx: &mut BlockCtx) {
        for (i, stream) in out.iter_mut().enumerate() {
            let buf = stream.samples_mut();
            for n in 0..buf.len() {
                let raised = self
                    .base
                    .at(inputs, i, n)
                    .powf(self.exponent.at(inputs, i, n));
                buf[n] = shape(raised, self.mul.at(inputs, i, n), self.add.at(inputs, i, n));
            }
        }
    }

    fn set_param(&mut self, name: &str, value: Param) -> Result<(), NoSuchParam> {
        match name {
            "base" => self.base = value,
            "exponent" => self.exponent = value,
            "mul" => self.mul = value,
            "add" => self.add = value,
            _ => return Err(NoSuchParam),
        }
        Ok(())
    }
}

/// Elementwise sum of any number of signals.
pub struct Sum {
    terms: Vec<Param>,
    mul: Param,
    add: Param,
}

impl Sum {
    pub fn new(terms: Vec<Param>) -> Self {
        Self {
            terms,
            mul: Param::Constant(1.0),
            add: Param::Constant(0.0),
        }
    }

    pub fn with_mul(mut self, mul: impl Into<Param>) -> Self {
        self.mul = mul.into();
        self
    }
}

impl SignalNode for Sum {
    fn params(&self) -> Vec<&Param> {
        let mut params: Vec<&Param> = self.terms.iter().collect();
        params.push(&self.mul);
        params.push(&self.add);
        params
    }

    fn process_block(&mut self, inputs: &Inputs, out: &mut [Stream], _ctx: &mut BlockCtx) {
        for (i, stream) in out.iter_mut().enumerate() {
            let buf = stream.samples_mut();
            for n in 0..buf.len() {
                let total: f32 = self.terms.iter().map(|t| t.at(inputs, i, n)).sum();
                buf[n] = shape(total, self.mul.at(inputs, i, n), self.add.at(inputs, i, n));
            }
        }
    }

    fn set_param(&mut self, name: &str, value: Param) -> Result<(), NoSuchParam> {
        match name {
            "mul" => self.mul = value,
            "add" => self.add = value,
            _ => return Err(NoSuchParam),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Server, ServerConfig};

    fn server() -> Server {
        let mut s = Server::new(ServerConfig {
            sample_rate: 48_000.0,
            block_size: 32,
            channels: 2,
            seed: 0,
        })
        .unwrap();
        s.start();
        s
    }

    #[test]
    fn product_ring_modulates_two_node_inputs() {
        let mut s = server();
        let a = s.add(Sig::new(0.5)).unwrap();
        let b = s.add(Sig::new(4.0)).unwrap();
        let p = s.add(Product::new(a, b).with_mul(0.5)).unwrap();
        s.tick();
        assert!(s.bank(p).unwrap()[0]
            .samples()
            .iter()
            .all(|&x| (x - 1.0).abs() < 1e-6));
    }

    #[test]
    fn product_expands_with_its_widest_parameter() {
        let mut s = server();
        let a = s.add(Sig::new(vec![1.0, 2.0, 3.0])).unwrap();
        let p = s.add(Product::new(a, vec![10.0, 20.0])).unwrap();
        assert_eq!(s.width(p), Some(3));
        s.tick();
        let bank = s.bank(p).unwrap();
        // b wraps: [10, 20, 10]
        assert_eq!(bank[0].samples()[0], 10.0);
        assert_eq!(bank[1].samples()[0], 40.0);
        assert_eq!(bank[2].samples()[0], 30.0);
    }

    #[test]
    fn power_raises_elementwise() {
        let mut s = server();
        let c = s.add(Sig::new(0.5)).unwrap();
        let e = s.add(Power::new(c, 2.0).with_mul(4.0)).unwrap();
        s.tick();
        assert!(s.bank(e).unwrap()[0]
            .samples()
            .iter()
            .all(|&x| (x - 1.0).abs() < 1e-6));
    }

    #[test]
    fn sum_adds_all_terms() {
        let mut s = server();
        let a = s.add(Sig::new(0.1)).unwrap();
        let b = s.add(Sig::new(0.2)).unwrap();
        let total = s
            .add(Sum::new(vec![a.into(), b.into(), Param::Constant(0.3)]))
            .unwrap();
        s.tick();
        assert!(s.bank(total).unwrap()[0]
            .samples()
            .iter()
            .all(|&x| (x - 0.6).abs() < 1e-6));
    }
}
