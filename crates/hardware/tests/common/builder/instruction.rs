use o3sim_core::common::constants::{REG_FLAGS, REG_INSTRUCTION_POINTER, REG_STACK_POINTER};
use o3sim_core::core::instruction::TraceInstr;

pub const SP: u8 = REG_STACK_POINTER;
pub const FLAGS: u8 = REG_FLAGS;
pub const IP: u8 = REG_INSTRUCTION_POINTER;

/// Builds `TraceInstr` records.
pub struct TraceBuilder(TraceInstr);

impl TraceBuilder {
    pub fn new(ip: u64) -> Self {
        Self(TraceInstr {
            ip,
            ..TraceInstr::default()
        })
    }

    pub fn src(mut self, regs: &[u8]) -> Self {
        self.0.source_registers.extend_from_slice(regs);
        self
    }

    pub fn dst(mut self, regs: &[u8]) -> Self {
        self.0.destination_registers.extend_from_slice(regs);
        self
    }

    pub fn load(mut self, address: u64) -> Self {
        self.0.source_memory.push(address);
        self
    }

    pub fn store(mut self, address: u64) -> Self {
        self.0.destination_memory.push(address);
        self
    }

    pub fn taken(mut self, taken: bool) -> Self {
        self.0.branch_taken = taken;
        self
    }

    pub fn target(mut self, target: u64) -> Self {
        self.0.branch_target = target;
        self
    }

    /// `dst = op(srcs)`.
    pub fn alu(self, src: &[u8], dst: &[u8]) -> Self {
        self.src(src).dst(dst)
    }

    /// Unconditional jump with an encoded target.
    pub fn direct_jump(self, target: u64) -> Self {
        self.dst(&[IP]).taken(true).target(target)
    }

    /// Flag-dependent branch.
    pub fn conditional(self, taken: bool, target: u64) -> Self {
        self.src(&[IP, FLAGS]).dst(&[IP]).taken(taken).target(target)
    }

    /// Call with an encoded target.
    pub fn direct_call(self, target: u64) -> Self {
        self.src(&[SP, IP]).dst(&[SP, IP]).taken(true).target(target)
    }

    /// Function return.
    pub fn ret(self, target: u64) -> Self {
        self.src(&[SP]).dst(&[SP, IP]).taken(true).target(target)
    }

    pub fn build(self) -> TraceInstr {
        self.0
    }
}

/// `count` independent single-cycle instructions at consecutive ips.
pub fn alu_run(start_ip: u64, count: usize) -> Vec<TraceInstr> {
    (0..count as u64)
        .map(|i| TraceBuilder::new(start_ip + 4 * i).alu(&[1], &[2]).build())
        .collect()
}
