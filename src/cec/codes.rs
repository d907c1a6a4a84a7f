//! CEC user control codes, as carried by USER_CONTROL_PRESSED messages.

use std::fmt;

/// Remote control button identifier from the CEC user control code space
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct UserControlCode(pub u8);

macro_rules! user_control_codes {
    ($($ident:ident = $value:literal => $name:literal,)*) => {
        impl UserControlCode {
            $(pub const $ident: UserControlCode = UserControlCode($value);)*

            const NAMES: &'static [(u8, &'static str)] = &[$(($value, $name),)*];
        }
    };
}

user_control_codes! {
    SELECT = 0x00 => "select",
    UP = 0x01 => "up",
    DOWN = 0x02 => "down",
    LEFT = 0x03 => "left",
    RIGHT = 0x04 => "right",
    RIGHT_UP = 0x05 => "right_up",
    RIGHT_DOWN = 0x06 => "right_down",
    LEFT_UP = 0x07 => "left_up",
    LEFT_DOWN = 0x08 => "left_down",
    ROOT_MENU = 0x09 => "root_menu",
    SETUP_MENU = 0x0a => "setup_menu",
    CONTENTS_MENU = 0x0b => "contents_menu",
    FAVORITE_MENU = 0x0c => "favorite_menu",
    EXIT = 0x0d => "exit",
    TOP_MENU = 0x10 => "top_menu",
    DVD_MENU = 0x11 => "dvd_menu",
    NUMBER_ENTRY_MODE = 0x1d => "number_entry_mode",
    NUMBER11 = 0x1e => "number11",
    NUMBER12 = 0x1f => "number12",
    NUMBER0 = 0x20 => "number0",
    NUMBER1 = 0x21 => "number1",
    NUMBER2 = 0x22 => "number2",
    NUMBER3 = 0x23 => "number3",
    NUMBER4 = 0x24 => "number4",
    NUMBER5 = 0x25 => "number5",
    NUMBER6 = 0x26 => "number6",
    NUMBER7 = 0x27 => "number7",
    NUMBER8 = 0x28 => "number8",
    NUMBER9 = 0x29 => "number9",
    DOT = 0x2a => "dot",
    ENTER = 0x2b => "enter",
    CLEAR = 0x2c => "clear",
    NEXT_FAVORITE = 0x2f => "next_favorite",
    CHANNEL_UP = 0x30 => "channel_up",
    CHANNEL_DOWN = 0x31 => "channel_down",
    PREVIOUS_CHANNEL = 0x32 => "previous_channel",
    SOUND_SELECT = 0x33 => "sound_select",
    INPUT_SELECT = 0x34 => "input_select",
    DISPLAY_INFORMATION = 0x35 => "display_information",
    HELP = 0x36 => "help",
    PAGE_UP = 0x37 => "page_up",
    PAGE_DOWN = 0x38 => "page_down",
    POWER = 0x40 => "power",
    VOLUME_UP = 0x41 => "volume_up",
    VOLUME_DOWN = 0x42 => "volume_down",
    MUTE = 0x43 => "mute",
    PLAY = 0x44 => "play",
    STOP = 0x45 => "stop",
    PAUSE = 0x46 => "pause",
    RECORD = 0x47 => "record",
    REWIND = 0x48 => "rewind",
    FAST_FORWARD = 0x49 => "fast_forward",
    EJECT = 0x4a => "eject",
    FORWARD = 0x4b => "forward",
    BACKWARD = 0x4c => "backward",
    STOP_RECORD = 0x4d => "stop_record",
    PAUSE_RECORD = 0x4e => "pause_record",
    ANGLE = 0x50 => "angle",
    SUB_PICTURE = 0x51 => "sub_picture",
    VIDEO_ON_DEMAND = 0x52 => "video_on_demand",
    ELECTRONIC_PROGRAM_GUIDE = 0x53 => "electronic_program_guide",
    TIMER_PROGRAMMING = 0x54 => "timer_programming",
    INITIAL_CONFIGURATION = 0x55 => "initial_configuration",
    SELECT_BROADCAST_TYPE = 0x56 => "select_broadcast_type",
    SELECT_SOUND_PRESENTATION = 0x57 => "select_sound_presentation",
    PLAY_FUNCTION = 0x60 => "play_function",
    PAUSE_PLAY_FUNCTION = 0x61 => "pause_play_function",
    RECORD_FUNCTION = 0x62 => "record_function",
    PAUSE_RECORD_FUNCTION = 0x63 => "pause_record_function",
    STOP_FUNCTION = 0x64 => "stop_function",
    MUTE_FUNCTION = 0x65 => "mute_function",
    RESTORE_VOLUME_FUNCTION = 0x66 => "restore_volume_function",
    TUNE_FUNCTION = 0x67 => "tune_function",
    SELECT_MEDIA_FUNCTION = 0x68 => "select_media_function",
    SELECT_AV_INPUT_FUNCTION = 0x69 => "select_av_input_function",
    SELECT_AUDIO_INPUT_FUNCTION = 0x6a => "select_audio_input_function",
    POWER_TOGGLE_FUNCTION = 0x6b => "power_toggle_function",
    POWER_OFF_FUNCTION = 0x6c => "power_off_function",
    POWER_ON_FUNCTION = 0x6d => "power_on_function",
    F1_BLUE = 0x71 => "f1_blue",
    F2_RED = 0x72 => "f2_red",
    F3_GREEN = 0x73 => "f3_green",
    F4_YELLOW = 0x74 => "f4_yellow",
    F5 = 0x75 => "f5",
    DATA = 0x76 => "data",
    AN_RETURN = 0x91 => "an_return",
    AN_CHANNELS_LIST = 0x96 => "an_channels_list",
    UNKNOWN = 0xff => "unknown",
}

impl UserControlCode {
    /// Name of the code, if it is one defined by the CEC specification
    pub fn name(&self) -> Option<&'static str> {
        Self::NAMES
            .iter()
            .find(|(value, _)| *value == self.0)
            .map(|(_, name)| *name)
    }

    /// Look up a code by its name, e.g. "f2_red"
    pub fn from_name(name: &str) -> Option<UserControlCode> {
        Self::NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(value, _)| UserControlCode(*value))
    }
}

impl fmt::Display for UserControlCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "0x{:02x}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::UserControlCode;

    #[test]
    fn names() {
        assert_eq!(UserControlCode::F2_RED.to_string(), "f2_red");
        assert_eq!(UserControlCode(0x0e).to_string(), "0x0e");
        assert_eq!(
            UserControlCode::from_name("Channel_Up"),
            Some(UserControlCode::CHANNEL_UP)
        );
        assert_eq!(UserControlCode::from_name("foo"), None);
    }
}
