// Constants shared by the parser engine and the emitter

/// Number of `(rule, position)` results the packrat cache holds before it
/// starts evicting the oldest insertion.
pub const DEFAULT_CACHE_CAPACITY: usize = 128;

/// Maximum number of nested rule invocations before a parse is aborted.
/// Turns runaway left recursion into a fault; stack space itself is handled
/// by growing the stack on demand.
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Remaining stack below which a nested rule invocation moves to a fresh segment
pub const STACK_RED_ZONE: usize = 128 * 1024;

/// Size of each stack segment allocated for deep rule nesting
pub const STACK_SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Bytes reserved per local variable slot
pub const SLOT_SIZE: usize = 8;

/// Bytes the emitter moves `sp` by when parking an operand on the machine stack.
/// Kept at 16 so `sp` stays aligned while an operand is parked.
pub const SPILL_SIZE: usize = 16;

/// `.p2align` exponent used for every emitted function
pub const FUNCTION_ALIGNMENT: u32 = 2;

/// Highest number of parameters passed in registers (`w0`..`w7`)
pub const MAX_REGISTER_PARAMS: usize = 8;
