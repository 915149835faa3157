// Fixed ratio arithmetic shared by the lattice presets.
//
// The node lattice has 144 entries, the depth lattice 99, and there are 99
// gates between them. Every node maps onto three gates: a primary gate by
// plain modulo, a harmonic gate by scaling with the golden ratio, and a
// spiral gate by scaling with the 144:99 ratio. `gate_to_nodes` is the
// inverse relation, found by scanning every node.
//
// These values are configuration data with no external oracle. The only
// guarantees are determinism and range: results depend on nothing but the
// arguments.
//
// Rounding note: `round((i * ratio) mod 99)` can reach 99, so harmonic and
// spiral gates range over 1..=100 while primary gates stay in 1..=99.

/// Golden ratio.
pub const PHI: f64 = 1.618033988749895;

/// The 144:99 lattice proportion.
pub const CATHEDRAL_RATIO: f64 = 144.0 / 99.0;

pub const NODE_COUNT: u32 = 144;
pub const DEPTH_COUNT: u32 = 99;
pub const GATE_COUNT: u32 = 99;

/// Number of consciousness levels (0..=21).
pub const LEVEL_COUNT: u32 = 22;

/// Lowest and highest solfeggio frequencies (Hz) that levels map onto.
pub const SOLFEGGIO_FLOOR: f64 = 396.0;
pub const SOLFEGGIO_CEILING: f64 = 963.0;

/// The three gates a node maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateMapping {
    pub primary: u32,
    pub harmonic: u32,
    pub spiral: u32,
}

impl GateMapping {
    pub fn contains(&self, gate: u32) -> bool {
        self.primary == gate || self.harmonic == gate || self.spiral == gate
    }
}

/// Map a node index onto its primary, harmonic, and spiral gates.
pub fn node_to_gates(index: u32) -> GateMapping {
    let scaled = |ratio: f64| ((f64::from(index) * ratio) % f64::from(GATE_COUNT)).round() as u32 + 1;
    GateMapping {
        primary: index % GATE_COUNT + 1,
        harmonic: scaled(PHI),
        spiral: scaled(CATHEDRAL_RATIO),
    }
}

/// All nodes in `0..total` with any gate equal to `gate`, ascending.
pub fn gate_to_nodes(gate: u32, total: u32) -> Vec<u32> {
    (0..total)
        .filter(|&node| node_to_gates(node).contains(gate))
        .collect()
}

/// Linear map of a level in 0..=21 onto the solfeggio span.
pub fn level_to_frequency(level: u32) -> f64 {
    let normalized = f64::from(level) / f64::from(LEVEL_COUNT - 1);
    SOLFEGGIO_FLOOR + normalized * (SOLFEGGIO_CEILING - SOLFEGGIO_FLOOR)
}

/// Number of Fibonacci steps whose value does not exceed `index`, wrapped
/// into 0..21.
pub fn fibonacci_position(index: u32) -> u32 {
    let target = u64::from(index);
    let (mut prev, mut cur) = (0u64, 1u64);
    let mut position = 0;
    while cur <= target {
        let next = prev + cur;
        prev = cur;
        cur = next;
        position += 1;
    }
    position % 21
}
