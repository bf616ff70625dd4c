use bitflags::bitflags;

bitflags! {
    pub struct CompileFlags: u32 {
        const NO_FLAG = 0;
        /// Textual recursive descent: whole-remainder alternation and
        /// group re-parsing under closure.
        const LEGACY_DESCENT = 1 << 1;
        /// `+` requires at least one repetition.
        const STRICT_PLUS = 1 << 2;
        /// Trim surrounding whitespace before compiling.
        const TRIM = 1 << 3;
    }
}

pub const DEFAULT_MAX_DEPTH: usize = 64;
pub const DEFAULT_MAX_PATTERN_LENGTH: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    pub flags: CompileFlags,
    pub max_depth: usize,
    pub max_pattern_length: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            flags: CompileFlags::STRICT_PLUS | CompileFlags::TRIM,
            max_depth: DEFAULT_MAX_DEPTH,
            max_pattern_length: DEFAULT_MAX_PATTERN_LENGTH,
        }
    }
}

impl CompileOptions {
    pub fn legacy() -> Self {
        CompileOptions {
            flags: CompileFlags::LEGACY_DESCENT | CompileFlags::TRIM,
            ..Default::default()
        }
    }

    pub fn with_flags(mut self, flags: CompileFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_pattern_length(mut self, max_pattern_length: usize) -> Self {
        self.max_pattern_length = max_pattern_length;
        self
    }

    pub fn is_legacy(&self) -> bool {
        self.flags.contains(CompileFlags::LEGACY_DESCENT)
    }

    pub fn strict_plus(&self) -> bool {
        self.flags.contains(CompileFlags::STRICT_PLUS)
    }
}
