//! デュアルモーターBLDC駆動のリアルタイム制御コア
//!
//! 2輪独立駆動EVの周期制御（サンプリング完了割り込み、約16kHz）を
//! ハードウェア非依存のライブラリとして切り出したものです。提供するのは
//!
//! - 周期ハンドラとオーバーランガード ([`BldcCore`])
//! - 起動時ADCオフセットキャリブレーション ([`bldc::calibration`])
//! - ホールセンサー復号とステップ計数 ([`bldc::hall`])
//! - 電流取得とハード過電流遮断 ([`bldc::current`])
//! - デューティ出力の再センタリングとクランプ ([`bldc::duty`])
//! - 間引き付きバッテリー電圧フィルタ ([`voltage_monitor`])
//!
//! の各段で、制御則そのもの（転流・トルク演算）は[`ControlLaw`]トレイト
//! 経由で外部実装を呼び出します。ADC・PWM・GPIOの実ハードウェアは
//! [`hardware`]のレコードとトレイトで抽象化しているため、ホスト上で
//! そのままテストできます。

#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod bldc;
pub mod config;
pub mod control_law;
pub mod hardware;
pub mod tone;
pub mod voltage_monitor;

pub use bldc::{BldcCore, MotorSide};
pub use config::BldcConfig;
pub use control_law::{ControlLaw, ControlType, LawInput, LawOutput};
pub use hardware::{AdcBuffer, HallLines, MotorBridge};
pub use tone::ToneGenerator;
pub use voltage_monitor::BatteryMonitor;
