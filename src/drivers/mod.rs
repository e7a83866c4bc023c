pub mod pwm;
