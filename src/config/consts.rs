/// Vacuum permeability, H/m (CODATA 2018)
pub const MU_0: f64 = 1.256_637_062_12e-6;
/// SI prefix 1e6
pub const MEGA: f64 = 1.0e6;
/// SI prefix 1e3
pub const KILO: f64 = 1.0e3;
/// Default number of toroidal-field coils
pub const DEFAULT_N_COIL: i64 = 18;
/// Default relative step for finite-difference Jacobians
pub const DEFAULT_FD_STEP: f64 = 1.0e-6;
/// Default number of poloidal points on a shaped plasma boundary
pub const DEFAULT_BOUNDARY_POINTS: usize = 180;
/// Elementary charge, C; also one electronvolt in joules (CODATA 2018)
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;
/// Electron mass in unified atomic mass units (CODATA 2018)
pub const ELECTRON_MASS_U: f64 = 5.485_799_090_65e-4;
/// SI prefix 1e-18
pub const ATTO: f64 = 1.0e-18;
/// Unified atomic mass unit, kg (CODATA 2018)
pub const ATOMIC_MASS_UNIT: f64 = 1.660_539_066_60e-27;
/// Energy released by one D-T fusion reaction, MeV
pub const DT_REACTION_ENERGY_MEV: f64 = 17.589_3;
/// Alpha particle (helium-4 nucleus) mass in u
pub const ALPHA_MASS_U: f64 = 4.001_506_179_127;
