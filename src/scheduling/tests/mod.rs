mod daily_scheduler_tests;
