//! IRC numeric replies
//!
//! Every constructor returns a framed line of the shape
//! `:<server> <code> <target> <params...> :<text>`, where the target is the
//! recipient's nickname or `*` before one is chosen.

use crate::message::frame;

/// IRC numeric reply codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum NumericReply {
    // Connection registration
    RplWelcome = 1,
    RplYourHost = 2,
    RplCreated = 3,
    RplMyInfo = 4,

    // Channel replies
    RplNoTopic = 331,
    RplTopic = 332,
    RplTopicWhoTime = 333,
    RplInviting = 341,
    RplNameReply = 353,
    RplEndOfNames = 366,

    // MOTD
    RplMotd = 372,
    RplMotdStart = 375,
    RplMotdEnd = 376,

    // Errors
    ErrNoSuchNick = 401,
    ErrNoSuchChannel = 403,
    ErrInvalidCapCmd = 410,
    ErrNoTextToSend = 412,
    ErrUnknownCommand = 421,
    ErrNoNicknameGiven = 431,
    ErrErroneousNickname = 432,
    ErrNicknameInUse = 433,
    ErrNotOnChannel = 442,
    ErrUserOnChannel = 443,
    ErrNotRegistered = 451,
    ErrNeedMoreParams = 461,
    ErrAlreadyRegistered = 462,
    ErrPasswdMismatch = 464,
    ErrInvalidUsername = 468,
    ErrChannelIsFull = 471,
    ErrUnknownMode = 472,
    ErrInviteOnlyChan = 473,
    ErrBadChannelKey = 475,
    ErrBadChanMask = 476,
    ErrChanOPrivsNeeded = 482,
    ErrInvalidModeParam = 696,
}

impl NumericReply {
    /// Three-digit numeric code
    pub fn code(&self) -> String {
        format!("{:03}", *self as u16)
    }

    /// Build a framed reply with a trailing text parameter
    pub fn reply(&self, server: &str, target: &str, params: &[&str], text: &str) -> String {
        let mut payload = format!(":{} {} {}", server, self.code(), target);
        for param in params {
            payload.push(' ');
            payload.push_str(param);
        }
        payload.push_str(" :");
        payload.push_str(text);
        frame(&payload)
    }

    /// Build a framed reply whose last parameter carries no trailing marker
    pub fn reply_plain(&self, server: &str, target: &str, params: &[&str]) -> String {
        let mut payload = format!(":{} {} {}", server, self.code(), target);
        for param in params {
            payload.push(' ');
            payload.push_str(param);
        }
        frame(&payload)
    }

    /// RPL_WELCOME
    pub fn welcome(server: &str, nick: &str, mask: &str) -> String {
        Self::RplWelcome.reply(
            server,
            nick,
            &[],
            &format!("Welcome to the Internet Relay Network {}", mask),
        )
    }

    /// RPL_YOURHOST
    pub fn your_host(server: &str, nick: &str, version: &str) -> String {
        Self::RplYourHost.reply(
            server,
            nick,
            &[],
            &format!("Your host is {}, running version {}", server, version),
        )
    }

    /// RPL_CREATED
    pub fn created(server: &str, nick: &str, date: &str) -> String {
        Self::RplCreated.reply(server, nick, &[], &format!("This server was created {}", date))
    }

    /// RPL_MYINFO
    pub fn my_info(server: &str, nick: &str, version: &str, channel_modes: &str) -> String {
        Self::RplMyInfo.reply_plain(server, nick, &[server, version, "o", channel_modes])
    }

    /// RPL_NOTOPIC
    pub fn no_topic(server: &str, nick: &str, channel: &str) -> String {
        Self::RplNoTopic.reply(server, nick, &[channel], "No topic is set")
    }

    /// RPL_TOPIC
    pub fn topic(server: &str, nick: &str, channel: &str, topic: &str) -> String {
        Self::RplTopic.reply(server, nick, &[channel], topic)
    }

    /// RPL_TOPICWHOTIME
    pub fn topic_who_time(server: &str, nick: &str, channel: &str, setter: &str, set_at: i64) -> String {
        Self::RplTopicWhoTime.reply_plain(server, nick, &[channel, setter, &set_at.to_string()])
    }

    /// RPL_INVITING
    pub fn inviting(server: &str, nick: &str, target: &str, channel: &str) -> String {
        Self::RplInviting.reply_plain(server, nick, &[target, channel])
    }

    /// RPL_NAMREPLY
    pub fn name_reply(server: &str, nick: &str, channel: &str, names: &str) -> String {
        Self::RplNameReply.reply(server, nick, &["=", channel], names)
    }

    /// RPL_ENDOFNAMES
    pub fn end_of_names(server: &str, nick: &str, channel: &str) -> String {
        Self::RplEndOfNames.reply(server, nick, &[channel], "End of /NAMES list")
    }

    /// RPL_MOTDSTART
    pub fn motd_start(server: &str, nick: &str) -> String {
        Self::RplMotdStart.reply(server, nick, &[], &format!("- {} Message of the day - ", server))
    }

    /// RPL_MOTD
    pub fn motd_line(server: &str, nick: &str, line: &str) -> String {
        Self::RplMotd.reply(server, nick, &[], &format!("- {}", line))
    }

    /// RPL_ENDOFMOTD
    pub fn motd_end(server: &str, nick: &str) -> String {
        Self::RplMotdEnd.reply(server, nick, &[], "End of /MOTD command")
    }

    /// ERR_NOSUCHNICK
    pub fn no_such_nick(server: &str, nick: &str, target: &str) -> String {
        Self::ErrNoSuchNick.reply(server, nick, &[target], "No such nick/channel")
    }

    /// ERR_NOSUCHCHANNEL
    pub fn no_such_channel(server: &str, nick: &str, channel: &str) -> String {
        Self::ErrNoSuchChannel.reply(server, nick, &[channel], "No such channel")
    }

    /// ERR_INVALIDCAPCMD
    pub fn invalid_cap_command(server: &str, nick: &str, subcommand: &str) -> String {
        Self::ErrInvalidCapCmd.reply(server, nick, &[subcommand], "Invalid CAP subcommand")
    }

    /// ERR_NOTEXTTOSEND
    pub fn no_text_to_send(server: &str, nick: &str) -> String {
        Self::ErrNoTextToSend.reply(server, nick, &[], "No text to send")
    }

    /// ERR_UNKNOWNCOMMAND
    pub fn unknown_command(server: &str, nick: &str, command: &str) -> String {
        Self::ErrUnknownCommand.reply(server, nick, &[command], "Unknown command")
    }

    /// ERR_NONICKNAMEGIVEN
    pub fn no_nickname_given(server: &str, nick: &str) -> String {
        Self::ErrNoNicknameGiven.reply(server, nick, &[], "No nickname given")
    }

    /// ERR_ERRONEUSNICKNAME
    pub fn erroneous_nickname(server: &str, nick: &str, attempted: &str) -> String {
        Self::ErrErroneousNickname.reply(server, nick, &[attempted], "Erroneous nickname")
    }

    /// ERR_NICKNAMEINUSE
    pub fn nickname_in_use(server: &str, nick: &str, attempted: &str) -> String {
        Self::ErrNicknameInUse.reply(server, nick, &[attempted], "Nickname is already in use")
    }

    /// ERR_NOTONCHANNEL
    pub fn not_on_channel(server: &str, nick: &str, channel: &str) -> String {
        Self::ErrNotOnChannel.reply(server, nick, &[channel], "You're not on that channel")
    }

    /// ERR_USERONCHANNEL
    pub fn user_on_channel(server: &str, nick: &str, target: &str, channel: &str) -> String {
        Self::ErrUserOnChannel.reply(server, nick, &[target, channel], "is already on channel")
    }

    /// ERR_NOTREGISTERED
    pub fn not_registered(server: &str, nick: &str) -> String {
        Self::ErrNotRegistered.reply(server, nick, &[], "You have not registered")
    }

    /// ERR_NEEDMOREPARAMS
    pub fn need_more_params(server: &str, nick: &str, command: &str) -> String {
        Self::ErrNeedMoreParams.reply(server, nick, &[command], "Not enough parameters")
    }

    /// ERR_ALREADYREGISTRED
    pub fn already_registered(server: &str, nick: &str) -> String {
        Self::ErrAlreadyRegistered.reply(server, nick, &[], "You may not reregister")
    }

    /// ERR_PASSWDMISMATCH
    pub fn password_mismatch(server: &str, nick: &str) -> String {
        Self::ErrPasswdMismatch.reply(server, nick, &[], "Password incorrect")
    }

    /// ERR_INVALIDUSERNAME
    pub fn invalid_username(server: &str, nick: &str) -> String {
        Self::ErrInvalidUsername.reply(server, nick, &[], "Your username is invalid")
    }

    /// ERR_CHANNELISFULL
    pub fn channel_is_full(server: &str, nick: &str, channel: &str) -> String {
        Self::ErrChannelIsFull.reply(server, nick, &[channel], "Cannot join channel (+l)")
    }

    /// ERR_UNKNOWNMODE
    pub fn unknown_mode(server: &str, nick: &str, mode: char) -> String {
        Self::ErrUnknownMode.reply(server, nick, &[&mode.to_string()], "is unknown mode char to me")
    }

    /// ERR_INVITEONLYCHAN
    pub fn invite_only_channel(server: &str, nick: &str, channel: &str) -> String {
        Self::ErrInviteOnlyChan.reply(server, nick, &[channel], "Cannot join channel (+i)")
    }

    /// ERR_BADCHANNELKEY
    pub fn bad_channel_key(server: &str, nick: &str, channel: &str) -> String {
        Self::ErrBadChannelKey.reply(server, nick, &[channel], "Cannot join channel (+k)")
    }

    /// ERR_BADCHANMASK
    pub fn bad_channel_mask(server: &str, nick: &str, channel: &str) -> String {
        Self::ErrBadChanMask.reply(server, nick, &[channel], "Bad Channel Mask")
    }

    /// ERR_CHANOPRIVSNEEDED
    pub fn chanop_privs_needed(server: &str, nick: &str, channel: &str) -> String {
        Self::ErrChanOPrivsNeeded.reply(server, nick, &[channel], "You're not channel operator")
    }

    /// ERR_INVALIDMODEPARAM
    pub fn invalid_mode_param(
        server: &str,
        nick: &str,
        channel: &str,
        mode: char,
        param: &str,
        description: &str,
    ) -> String {
        Self::ErrInvalidModeParam.reply(
            server,
            nick,
            &[channel, &mode.to_string(), param],
            description,
        )
    }
}
