//! # Help Text
//!
//! Command overview shown by the `/help` handler.

pub const MAIN: &str = concat!(
    "**🤖 Switchboard Help**\n",
    "Use: /command _args_ (a leading `.` works too)\n",
    "\n",
    "**💬 Session**\n",
    "* status: Session and uptime info\n",
    "* note [text]: Save a note in this conversation\n",
    "* note list: Show saved notes\n",
    "* note clear: Forget all notes\n",
    "* done: Close this session\n",
    "\n",
    "**⚡ Misc**\n",
    "* help: This overview\n",
    "* Say hello and the bot says hello back\n"
);
