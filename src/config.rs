//! 駆動コアの設定パラメータ
//!
//! ハードコードされたしきい値を型付きの設定レコードにまとめて管理します。
//! デフォルト値は実機で運用されているチューニング値と同一です。

use crate::control_law::ControlType;

/// PWMタイマーの入力クロック [Hz]（センターアラインドのため実周期は1/2）
pub const TIM_CLOCK_HZ: u32 = 64_000_000;

/// キャリブレーションのサンプル数（デフォルト値）
pub const DEFAULT_CALIBRATION_SAMPLES: u32 = 1024;

/// DCリンク電流のハードリミット [A]（Level 2保護、デフォルト値）
pub const DEFAULT_I_DC_MAX_AMPS: i16 = 17;

/// 電流のA→ADCカウント変換係数 [counts/A]（シャント・アンプ回路で決まる）
pub const DEFAULT_AMP_TO_COUNTS: i16 = 50;

/// PWM周波数 [Hz]（デフォルト値）
pub const DEFAULT_PWM_FREQ_HZ: u32 = 16_000;

/// FOCモード時のPWMマージン [timer units]
/// 電流測定のサンプリング窓をPWM周期内に確保するために必要
pub const DEFAULT_FOC_MARGIN: u16 = 110;

/// バッテリー電圧フィルタ係数 fixdt(0,16,16)（655 ≈ 0.01）
pub const DEFAULT_BAT_FILT_COEF: u16 = 655;

/// バッテリー電圧フィルタの間引き周期 [ticks]
pub const DEFAULT_BAT_FILT_DECIMATION: u64 = 1000;

/// バッテリーセル数（デフォルト値）
pub const DEFAULT_BAT_CELLS: u16 = 10;

/// バッテリー電圧校正: ADCカウント値（実測値とペアで校正）
pub const DEFAULT_BAT_CALIB_ADC: u32 = 1492;

/// バッテリー電圧校正: 上記カウント時の実電圧 [V*100]
pub const DEFAULT_BAT_CALIB_REAL_VOLTAGE: u32 = 3970;

/// 駆動コアの設定レコード
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BldcConfig {
    /// キャリブレーションで平均するサンプル数
    pub calibration_samples: u32,
    /// DCリンク電流ハードリミット [A]
    pub i_dc_max_amps: i16,
    /// A→ADCカウント変換係数 [counts/A]
    pub amp_to_counts: i16,
    /// PWM周波数 [Hz]
    pub pwm_freq_hz: u32,
    /// FOCモード時のPWMマージン [timer units]（他モードでは0）
    pub foc_margin: u16,
    /// 左モーターの転流方式
    pub ctrl_type_left: ControlType,
    /// 右モーターの転流方式
    pub ctrl_type_right: ControlType,
    /// バッテリー電圧フィルタ係数 fixdt(0,16,16)
    pub bat_filt_coef: u16,
    /// バッテリー電圧フィルタの間引き周期 [ticks]
    pub bat_filt_decimation: u64,
    /// バッテリーセル数
    pub bat_cells: u16,
    /// バッテリー電圧校正: ADCカウント値
    pub bat_calib_adc: u32,
    /// バッテリー電圧校正: 実電圧 [V*100]
    pub bat_calib_real_voltage: u32,
}

impl Default for BldcConfig {
    fn default() -> Self {
        Self {
            calibration_samples: DEFAULT_CALIBRATION_SAMPLES,
            i_dc_max_amps: DEFAULT_I_DC_MAX_AMPS,
            amp_to_counts: DEFAULT_AMP_TO_COUNTS,
            pwm_freq_hz: DEFAULT_PWM_FREQ_HZ,
            foc_margin: DEFAULT_FOC_MARGIN,
            ctrl_type_left: ControlType::FieldOriented,
            ctrl_type_right: ControlType::FieldOriented,
            bat_filt_coef: DEFAULT_BAT_FILT_COEF,
            bat_filt_decimation: DEFAULT_BAT_FILT_DECIMATION,
            bat_cells: DEFAULT_BAT_CELLS,
            bat_calib_adc: DEFAULT_BAT_CALIB_ADC,
            bat_calib_real_voltage: DEFAULT_BAT_CALIB_REAL_VOLTAGE,
        }
    }
}

impl BldcConfig {
    /// DCリンク電流リミットをADCカウント単位で取得
    pub fn dc_cur_limit(&self) -> i16 {
        self.i_dc_max_amps * self.amp_to_counts
    }

    /// PWM周期 [timer units]（センターアラインド）
    pub fn pwm_period(&self) -> u16 {
        (TIM_CLOCK_HZ / 2 / self.pwm_freq_hz) as u16
    }

    /// バッテリー電圧フィルタの初期値 [ADC counts]
    /// （4.00V/セルを校正ペアでカウント値に換算）
    pub fn bat_voltage_init(&self) -> i16 {
        ((400 * self.bat_cells as u32 * self.bat_calib_adc) / self.bat_calib_real_voltage) as i16
    }
}
