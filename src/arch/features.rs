//! CPU feature probing (spec §3 "CPU feature probe").
//!
//! The original (`ia64.cpp`) reads CPUID directly; this keeps the same
//! surface (`sse_level_supported`, `avx_supported`, `osxsave_enabled`) on
//! top of the `raw-cpuid` crate, the idiomatic Rust way to query CPUID.

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum SseLevel {
    Sse,
    Sse2,
    Sse3,
    Ssse3,
    Sse4_1,
    Sse4_2,
}

#[cfg(target_arch = "x86_64")]
fn feature_info() -> Option<raw_cpuid::FeatureInfo> {
    raw_cpuid::CpuId::new().get_feature_info()
}

#[cfg(target_arch = "x86_64")]
pub fn sse_level_supported(level: SseLevel) -> bool {
    match feature_info() {
        Some(f) => match level {
            SseLevel::Sse => f.has_sse(),
            SseLevel::Sse2 => f.has_sse2(),
            SseLevel::Sse3 => f.has_sse3(),
            SseLevel::Ssse3 => f.has_ssse3(),
            SseLevel::Sse4_1 => f.has_sse41(),
            SseLevel::Sse4_2 => f.has_sse42(),
        },
        None => false,
    }
}

#[cfg(target_arch = "x86_64")]
pub fn avx_supported() -> bool {
    feature_info().map(|f| f.has_avx()).unwrap_or(false)
        && osxsave_enabled()
}

#[cfg(target_arch = "x86_64")]
pub fn osxsave_enabled() -> bool {
    feature_info().map(|f| f.has_oxsave()).unwrap_or(false)
}

#[cfg(target_arch = "x86_64")]
pub fn avx512_supported() -> bool {
    raw_cpuid::CpuId::new()
        .get_extended_feature_info()
        .map(|f| f.has_avx512f())
        .unwrap_or(false)
        && osxsave_enabled()
}

#[cfg(not(target_arch = "x86_64"))]
pub fn sse_level_supported(_level: SseLevel) -> bool {
    false
}

#[cfg(not(target_arch = "x86_64"))]
pub fn avx_supported() -> bool {
    false
}

#[cfg(not(target_arch = "x86_64"))]
pub fn osxsave_enabled() -> bool {
    false
}

#[cfg(not(target_arch = "x86_64"))]
pub fn avx512_supported() -> bool {
    false
}
